use crate::query::{
    ast::update::Update,
    renderer::{Render, Renderer},
};

impl Render for Update {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("UPDATE ");
        r.render_table_ref(&self.table);
        if let Some(alias) = &self.alias {
            r.sql.push_str(" AS ");
            r.push_ident(alias);
        }

        r.sql.push_str(" SET ");
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            r.push_ident(&assignment.column);
            r.sql.push_str(" = ");
            assignment.value.render(r);
        }

        if let Some(where_clause) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            where_clause.render(r);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        query::{
            ast::{
                expr::{BinaryOperator, Expr},
                update::{Assignment, Update},
            },
            dialect::Sqlite,
            ident,
            renderer::render,
            value,
        },
        table_ref,
    };
    use model::core::value::Value;

    #[test]
    fn test_render_update_by_key() {
        let ast = Update {
            table: table_ref!("B"),
            alias: None,
            assignments: vec![Assignment {
                column: "marker".to_string(),
                value: value(Value::Boolean(true)),
            }],
            where_clause: Some(Expr::binary(
                ident("id"),
                BinaryOperator::Eq,
                value(Value::Int(1)),
            )),
        };

        let (sql, params) = render(&ast, &Sqlite);
        assert_eq!(sql, r#"UPDATE "B" SET "marker" = ?1 WHERE ("id" = ?2)"#);
        assert_eq!(params, vec![Value::Boolean(true), Value::Int(1)]);
    }
}
