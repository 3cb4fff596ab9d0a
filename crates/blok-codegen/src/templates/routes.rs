//! `src/App.tsx`: router shell with generated import and route regions.
//!
//! Everything outside the `imports` and `routes` regions belongs to the
//! project author once written; reruns only replace the region bodies.

use super::shared_banner;
use crate::region::{jsx_begin, jsx_end, ts_begin, ts_end};
use blok_core::naming::{entity_name, pascal_case};
use blok_core::schema::Schema;

pub const IMPORTS_REGION: &str = "imports";
pub const ROUTES_REGION: &str = "routes";

pub fn render(schema: &Schema) -> String {
    let mut imports = String::from(
        "import DashboardView from \"./components/views/DashboardView\";\n",
    );
    let mut routes = String::from(
        "              <Route path=\"/dashboard\" element={<DashboardView />} />\n",
    );

    for table in schema.table_names() {
        let view = format!("{}View", pascal_case(table));
        let form = format!("{}FormView", entity_name(table));
        imports.push_str(&format!(
            "import {view} from \"./components/views/{view}\";\nimport {form} from \"./components/views/{form}\";\n"
        ));
        for (path, element) in [
            (format!("/{}", table), &view),
            (format!("/{}/new", table), &form),
            (format!("/{}/:id/edit", table), &form),
        ] {
            routes.push_str(&format!(
                "              <Route path=\"{path}\" element={{<{element} />}} />\n"
            ));
        }
    }

    format!(
        r#"{banner}
import {{ BrowserRouter, Routes, Route, Navigate }} from "react-router-dom";
import {{ ThemeProvider, CssBaseline, Box }} from "@mui/material";
import {{ GoogleOAuthProvider }} from "@react-oauth/google";
import {{ createAppProvider, useAuth }} from "@rationalbloks/universalfront";
import {{ createAppTheme }} from "./theme";
import {{ authApi }} from "./services/appApi";
import Navbar from "./components/shared/Navbar";
import "./styles/globals.css";

{imports_begin}
{imports}{imports_end}

const AppProvider = createAppProvider(authApi);
const theme = createAppTheme();
const GOOGLE_CLIENT_ID = import.meta.env.VITE_GOOGLE_CLIENT_ID || "";

function AppContent() {{
  const {{ isAuthenticated }} = useAuth();

  return (
    <Box display="flex" flexDirection="column" minHeight="100vh">
      <Navbar />
      <Box component="main" flexGrow={{1}} p={{3}}>
        <Routes>
          <Route
            path="/"
            element={{<Navigate to={{isAuthenticated ? "/dashboard" : "/login"}} replace />}}
          />
          {{isAuthenticated && (
            <>
              {routes_begin}
{routes}              {routes_end}
            </>
          )}}
          <Route path="*" element={{<Navigate to="/dashboard" replace />}} />
        </Routes>
      </Box>
    </Box>
  );
}}

export default function App() {{
  return (
    <GoogleOAuthProvider clientId={{GOOGLE_CLIENT_ID}}>
      <AppProvider>
        <ThemeProvider theme={{theme}}>
          <CssBaseline />
          <BrowserRouter>
            <AppContent />
          </BrowserRouter>
        </ThemeProvider>
      </AppProvider>
    </GoogleOAuthProvider>
  );
}}
"#,
        banner = shared_banner("Application routes"),
        imports_begin = ts_begin(IMPORTS_REGION),
        imports = imports,
        imports_end = ts_end(IMPORTS_REGION),
        routes_begin = jsx_begin(ROUTES_REGION),
        routes = routes,
        routes_end = jsx_end(ROUTES_REGION),
    )
}
