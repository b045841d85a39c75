use crate::query::{
    ast::create_table::{ColumnDef, CreateTable, TableConstraint},
    renderer::{Render, Renderer},
};

impl Render for CreateTable {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("CREATE TABLE ");
        if self.if_not_exists {
            r.sql.push_str("IF NOT EXISTS ");
        }
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");

        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            column.render(r);
        }

        for constraint in &self.constraints {
            r.sql.push_str(", ");
            constraint.render(r);
        }

        r.sql.push(')');
    }
}

impl Render for ColumnDef {
    fn render(&self, r: &mut Renderer) {
        r.push_ident(&self.name);
        r.sql.push(' ');
        r.sql.push_str(&self.data_type);
        if !self.is_nullable {
            r.sql.push_str(" NOT NULL");
        }
    }
}

impl Render for TableConstraint {
    fn render(&self, r: &mut Renderer) {
        match self {
            TableConstraint::PrimaryKey { name, columns } => {
                if let Some(name) = name {
                    r.sql.push_str("CONSTRAINT ");
                    r.push_ident(name);
                    r.sql.push(' ');
                }
                r.sql.push_str("PRIMARY KEY (");
                r.push_ident_list(columns);
                r.sql.push(')');
            }
            TableConstraint::ForeignKey {
                columns,
                references,
                referenced_columns,
            } => {
                r.sql.push_str("FOREIGN KEY (");
                r.push_ident_list(columns);
                r.sql.push_str(") REFERENCES ");
                r.render_table_ref(references);
                r.sql.push_str(" (");
                r.push_ident_list(referenced_columns);
                r.sql.push(')');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        query::{
            ast::create_table::{ColumnDef, CreateTable, TableConstraint},
            dialect::Sqlite,
            renderer::render,
        },
        table_ref,
    };

    #[test]
    fn test_render_create_table_with_keys() {
        let ast = CreateTable {
            table: table_ref!("B"),
            columns: vec![
                ColumnDef {
                    name: "id".into(),
                    data_type: "INTEGER".into(),
                    is_nullable: false,
                },
                ColumnDef {
                    name: "fk".into(),
                    data_type: "INTEGER".into(),
                    is_nullable: true,
                },
            ],
            constraints: vec![
                TableConstraint::PrimaryKey {
                    name: Some("B_pkey".into()),
                    columns: vec!["id".into()],
                },
                TableConstraint::ForeignKey {
                    columns: vec!["fk".into()],
                    references: table_ref!("A"),
                    referenced_columns: vec!["id".into()],
                },
            ],
            if_not_exists: true,
        };

        let (sql, params) = render(&ast, &Sqlite);
        assert_eq!(
            sql,
            concat!(
                r#"CREATE TABLE IF NOT EXISTS "B" ("id" INTEGER NOT NULL, "fk" INTEGER, "#,
                r#"CONSTRAINT "B_pkey" PRIMARY KEY ("id"), "#,
                r#"FOREIGN KEY ("fk") REFERENCES "A" ("id"))"#
            )
        );
        assert!(params.is_empty());
    }
}
