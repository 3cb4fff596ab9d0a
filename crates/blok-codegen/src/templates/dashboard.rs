//! `src/components/views/DashboardView.tsx`: one count card per entity.

use super::{banner, ts_string};
use blok_core::naming::{camel_case, label, screaming_snake_case};
use blok_core::schema::Schema;

pub fn render(schema: &Schema, app_name: &str) -> String {
    let tables: Vec<&str> = schema.table_names().collect();

    let stat_fields: String = tables
        .iter()
        .map(|t| format!("  {}Count: number;\n", camel_case(t)))
        .collect();
    let initial: String = tables
        .iter()
        .map(|t| format!("    {}Count: 0,\n", camel_case(t)))
        .collect();
    let fetches: String = tables
        .iter()
        .map(|t| {
            format!(
                "        getApi().getAll<unknown>(ENTITIES.{}),\n",
                screaming_snake_case(t)
            )
        })
        .collect();
    // Suffixed so a table named like a JS keyword still yields a binding.
    let bindings = tables
        .iter()
        .map(|t| format!("{}Rows", camel_case(t)))
        .collect::<Vec<_>>()
        .join(", ");
    let assignments: String = tables
        .iter()
        .map(|t| {
            format!(
                "        {name}Count: {name}Rows?.length || 0,\n",
                name = camel_case(t)
            )
        })
        .collect();
    let cards: String = tables
        .iter()
        .map(|t| {
            format!(
                r#"        <Grid size={{{{ xs: 12, sm: 6, md: 4 }}}}>
          <Card sx={{{{ cursor: "pointer" }}}} onClick={{() => navigate("/{table}")}}>
            <CardContent>
              <Typography variant="h6" color="text.secondary">
                {title}
              </Typography>
              <Typography variant="h3" fontWeight="bold">
                {{stats.{name}Count}}
              </Typography>
            </CardContent>
          </Card>
        </Grid>
"#,
                table = t,
                title = label(t),
                name = camel_case(t),
            )
        })
        .collect();

    format!(
        r#"{banner}
import {{ useState, useEffect }} from "react";
import {{ useNavigate }} from "react-router-dom";
import {{ Box, Typography, Grid, Card, CardContent, CircularProgress }} from "@mui/material";
import {{ getApi, ENTITIES }} from "../../services/appApi";

interface DashboardStats {{
{stat_fields}}}

export default function DashboardView() {{
  const navigate = useNavigate();
  const [loading, setLoading] = useState(true);
  const [stats, setStats] = useState<DashboardStats>({{
{initial}  }});

  useEffect(() => {{
    loadStats();
  }}, []);

  async function loadStats() {{
    try {{
      const [{bindings}] = await Promise.all([
{fetches}      ]);
      setStats({{
{assignments}      }});
    }} catch (err) {{
      console.error("Failed to load dashboard stats:", err);
    }} finally {{
      setLoading(false);
    }}
  }}

  if (loading) {{
    return (
      <Box display="flex" justifyContent="center" alignItems="center" minHeight="400px">
        <CircularProgress />
      </Box>
    );
  }}

  return (
    <Box>
      <Typography variant="h4" fontWeight="bold" mb={{3}}>
        {{{app_name}}} Dashboard
      </Typography>
      <Grid container spacing={{3}}>
{cards}      </Grid>
    </Box>
  );
}}
"#,
        banner = banner("Dashboard"),
        stat_fields = stat_fields,
        initial = initial,
        bindings = bindings,
        fetches = fetches,
        assignments = assignments,
        app_name = ts_string(app_name),
        cards = cards,
    )
}
