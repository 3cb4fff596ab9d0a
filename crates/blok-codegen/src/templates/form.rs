//! `src/components/views/<Entity>FormView.tsx`: create/edit form for one entity.

use super::{FieldView, banner, default_literal, editable, fields, ts_string};
use crate::error::CodegenError;
use crate::type_mapper::TargetType;
use blok_core::naming::{entity_name, label, screaming_snake_case};
use blok_core::schema::TableSpec;

fn input(field: &FieldView<'_>) -> String {
    let name = field.name;
    let field_label = label(name);
    let required = if field.spec.required {
        "\n              required"
    } else {
        ""
    };

    match &field.target {
        TargetType::Union(values) => {
            let items: String = values
                .iter()
                .map(|v| {
                    format!(
                        "                <MenuItem value={}>{}</MenuItem>\n",
                        ts_string(v),
                        label(v)
                    )
                })
                .collect();
            format!(
                r#"            <FormControl fullWidth{required_attr}>
              <InputLabel>{field_label}</InputLabel>
              <Select
                value={{formData.{name} ?? ""}}
                label="{field_label}"
                onChange={{(e) => handleChange("{name}", e.target.value)}}
              >
{items}              </Select>
            </FormControl>

"#,
                required_attr = if field.spec.required { " required" } else { "" },
            )
        }
        TargetType::Boolean => format!(
            r#"            <FormControlLabel
              control={{
                <Switch
                  checked={{Boolean(formData.{name})}}
                  onChange={{(e) => handleChange("{name}", e.target.checked)}}
                />
              }}
              label="{field_label}"
            />

"#
        ),
        TargetType::Integer | TargetType::Decimal { .. } => {
            let parse = if matches!(field.target, TargetType::Decimal { .. }) {
                "parseFloat"
            } else {
                "parseInt"
            };
            format!(
                r#"            <TextField
              label="{field_label}"
              type="number"
              value={{formData.{name} ?? 0}}
              onChange={{(e) => handleChange("{name}", {parse}(e.target.value) || 0)}}
              fullWidth{required}
            />

"#
            )
        }
        TargetType::Date | TargetType::DateTime => {
            let input_type = if field.target == TargetType::DateTime {
                "datetime-local"
            } else {
                "date"
            };
            format!(
                r#"            <TextField
              label="{field_label}"
              type="{input_type}"
              value={{formData.{name} ?? ""}}
              onChange={{(e) => handleChange("{name}", e.target.value)}}
              fullWidth
              InputLabelProps={{{{ shrink: true }}}}{required}
            />

"#
            )
        }
        TargetType::Json => format!(
            r#"            <TextField
              label="{field_label}"
              defaultValue={{JSON.stringify(formData.{name} ?? {{}}, null, 2)}}
              onBlur={{(e) => {{
                try {{
                  handleChange("{name}", JSON.parse(e.target.value));
                }} catch {{
                  setError("{field_label} must be valid JSON");
                }}
              }}}}
              multiline
              rows={{4}}
              fullWidth{required}
            />

"#
        ),
        TargetType::Text { max_length } => {
            let extra = match max_length {
                None => "\n              multiline\n              rows={4}".to_string(),
                Some(max) => format!("\n              inputProps={{{{ maxLength: {} }}}}", max),
            };
            format!(
                r#"            <TextField
              label="{field_label}"
              value={{formData.{name} ?? ""}}
              onChange={{(e) => handleChange("{name}", e.target.value)}}{extra}
              fullWidth{required}
            />

"#
            )
        }
        TargetType::Identifier => format!(
            r#"            <TextField
              label="{field_label}"
              value={{formData.{name} ?? ""}}
              onChange={{(e) => handleChange("{name}", e.target.value)}}
              fullWidth{required}
            />

"#
        ),
    }
}

pub fn render(table: &str, spec: &TableSpec) -> Result<String, CodegenError> {
    let entity = entity_name(table);
    let constant = screaming_snake_case(table);

    let fields = fields(table, spec)?;
    let editable = editable(&fields);

    let initial: String = editable
        .iter()
        .map(|f| format!("    {}: {},\n", f.name, default_literal(f)))
        .collect();
    let loaded: String = editable
        .iter()
        .map(|f| format!("        {name}: data.{name},\n", name = f.name))
        .collect();
    let inputs: String = editable.iter().map(|f| input(f)).collect();

    Ok(format!(
        r#"{banner}
import {{ useState, useEffect }} from "react";
import {{ useNavigate, useParams }} from "react-router-dom";
import {{
  Box,
  Typography,
  Button,
  Paper,
  TextField,
  FormControl,
  InputLabel,
  Select,
  MenuItem,
  FormControlLabel,
  Switch,
  CircularProgress,
  Alert,
}} from "@mui/material";
import {{ Save, ArrowBack }} from "@mui/icons-material";
import {{ getApi, ENTITIES }} from "../../services/appApi";
import type {{ {entity}, Create{entity}Input }} from "../../types/generated";

export default function {entity}FormView() {{
  const navigate = useNavigate();
  const {{ id }} = useParams<{{ id: string }}>();
  const isEdit = Boolean(id);

  const [loading, setLoading] = useState(isEdit);
  const [saving, setSaving] = useState(false);
  const [error, setError] = useState<string | null>(null);
  const [formData, setFormData] = useState<Create{entity}Input>({{
{initial}  }});

  useEffect(() => {{
    if (isEdit && id) {{
      loadData(id);
    }}
  }}, [id, isEdit]);

  async function loadData(itemId: string) {{
    try {{
      setLoading(true);
      const data = await getApi().getOne<{entity}>(ENTITIES.{constant}, itemId);
      setFormData({{
{loaded}      }});
    }} catch (err) {{
      setError(err instanceof Error ? err.message : "Failed to load data");
    }} finally {{
      setLoading(false);
    }}
  }}

  async function handleSubmit(e: React.FormEvent) {{
    e.preventDefault();
    try {{
      setSaving(true);
      setError(null);
      if (isEdit && id) {{
        await getApi().update<{entity}>(ENTITIES.{constant}, id, formData);
      }} else {{
        await getApi().create<{entity}>(ENTITIES.{constant}, formData);
      }}
      navigate("/{table}");
    }} catch (err) {{
      setError(err instanceof Error ? err.message : "Failed to save");
    }} finally {{
      setSaving(false);
    }}
  }}

  function handleChange(field: keyof Create{entity}Input, value: unknown) {{
    setFormData((prev) => ({{ ...prev, [field]: value }}));
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
      <Box display="flex" alignItems="center" gap={{2}} mb={{3}}>
        <Button startIcon={{<ArrowBack />}} onClick={{() => navigate("/{table}")}}>
          Back
        </Button>
        <Typography variant="h4" fontWeight="bold">
          {{isEdit ? "Edit" : "New"}} {entity}
        </Typography>
      </Box>

      {{error && (
        <Alert severity="error" sx={{{{ mb: 2 }}}}>
          {{error}}
        </Alert>
      )}}

      <Paper sx={{{{ p: 3 }}}}>
        <form onSubmit={{handleSubmit}}>
          <Box display="flex" flexDirection="column" gap={{3}}>
{inputs}            <Box display="flex" gap={{2}} justifyContent="flex-end">
              <Button variant="outlined" onClick={{() => navigate("/{table}")}}>
                Cancel
              </Button>
              <Button
                type="submit"
                variant="contained"
                startIcon={{saving ? <CircularProgress size={{20}} /> : <Save />}}
                disabled={{saving}}
              >
                {{saving ? "Saving..." : "Save"}}
              </Button>
            </Box>
          </Box>
        </form>
      </Paper>
    </Box>
  );
}}
"#,
        banner = banner(&format!("{} form", entity)),
        entity = entity,
        constant = constant,
        table = table,
        initial = initial,
        loaded = loaded,
        inputs = inputs,
    ))
}
