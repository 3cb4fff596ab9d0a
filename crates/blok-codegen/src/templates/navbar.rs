//! `src/config/Navbar.tsx`: app name and navigation entries.

use super::{shared_banner, ts_string};
use crate::region::{ts_begin, ts_end};
use blok_core::naming::label;
use blok_core::schema::Schema;

pub const NAV_REGION: &str = "nav-items";

pub fn render(schema: &Schema, app_name: &str) -> String {
    let mut items = String::from("  { label: \"Dashboard\", path: \"/dashboard\" },\n");
    for table in schema.table_names() {
        items.push_str(&format!(
            "  {{ label: {}, path: {} }},\n",
            ts_string(&label(table)),
            ts_string(&format!("/{}", table))
        ));
    }

    format!(
        r#"{banner}
export const APP_NAME = {app_name};

export interface NavItem {{
  label: string;
  path: string;
}}

export const NAV_ITEMS: NavItem[] = [
{begin}
{items}{end}
];
"#,
        banner = shared_banner("Navigation"),
        app_name = ts_string(app_name),
        begin = ts_begin(NAV_REGION),
        items = items,
        end = ts_end(NAV_REGION),
    )
}
