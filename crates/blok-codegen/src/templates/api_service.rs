//! `src/services/appApi.ts`: the single generic data-access surface.
//!
//! Components call `getApi().getAll<T>(ENTITIES.X)` and friends; there are no
//! per-table methods, so the only schema-dependent part is `ENTITIES`.

use super::{banner, ts_string};
use crate::generator::GeneratorOptions;
use blok_core::naming::screaming_snake_case;
use blok_core::schema::Schema;

pub fn render(schema: &Schema, options: &GeneratorOptions) -> String {
    let entities: String = schema
        .table_names()
        .map(|table| format!("  {}: {},\n", screaming_snake_case(table), ts_string(table)))
        .collect();

    format!(
        r#"{banner}
import {{ createAuthApi }} from {auth_package};
import {{ initApi, getApi }} from {crud_package};

const API_URL = import.meta.env.{api_url_env} || {api_url};

const authApi = createAuthApi(API_URL);
initApi(authApi);

export const ENTITIES = {{
{entities}}} as const;

export type EntityName = (typeof ENTITIES)[keyof typeof ENTITIES];

export {{ authApi, getApi }};
"#,
        banner = banner("Data access"),
        auth_package = ts_string(&options.auth_package),
        crud_package = ts_string(&options.crud_package),
        api_url_env = options.api_url_env,
        api_url = ts_string(&options.api_url),
        entities = entities,
    )
}
