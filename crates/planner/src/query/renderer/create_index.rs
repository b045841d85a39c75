use crate::query::{
    ast::create_index::CreateIndex,
    renderer::{Render, Renderer},
};

impl Render for CreateIndex {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("CREATE ");
        if self.unique {
            r.sql.push_str("UNIQUE ");
        }
        r.sql.push_str("INDEX ");
        if self.if_not_exists {
            r.sql.push_str("IF NOT EXISTS ");
        }
        r.push_ident(&self.name);
        r.sql.push_str(" ON ");
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");
        r.push_ident_list(&self.columns);
        r.sql.push(')');
    }
}
