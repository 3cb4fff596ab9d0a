//! `src/types/generated.ts`: one interface per table plus create/update inputs.

use super::{OWNER_FIELD, banner, fields};
use crate::error::CodegenError;
use blok_core::naming::entity_name;
use blok_core::schema::Schema;

pub fn render(schema: &Schema) -> Result<String, CodegenError> {
    let mut out = banner("Entity types");
    out.push('\n');

    for (table, spec) in schema.tables() {
        let name = entity_name(table);
        let fields = fields(table, spec)?;

        out.push_str(&format!("export interface {} {{\n", name));
        out.push_str("  id: string;\n");
        for field in &fields {
            let optional = if field.spec.required { "" } else { "?" };
            out.push_str(&format!(
                "  {}{}: {};\n",
                field.name,
                optional,
                field.target.typescript()
            ));
        }
        out.push_str("  created_at: string;\n");
        out.push_str("  updated_at: string;\n");
        out.push_str("}\n\n");

        out.push_str(&format!("export interface Create{}Input {{\n", name));
        for field in fields.iter().filter(|f| f.name != OWNER_FIELD) {
            let optional = if field.spec.required { "" } else { "?" };
            out.push_str(&format!(
                "  {}{}: {};\n",
                field.name,
                optional,
                field.target.typescript()
            ));
        }
        out.push_str("}\n\n");

        out.push_str(&format!(
            "export type Update{name}Input = Partial<Create{name}Input>;\n\n",
            name = name
        ));
    }

    // Single trailing newline.
    while out.ends_with("\n\n") {
        out.pop();
    }
    Ok(out)
}
