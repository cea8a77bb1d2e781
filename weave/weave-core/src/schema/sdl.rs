//! SDL rendering

use std::fmt::Write;

use super::object::ArgumentDef;
use super::registry::{Schema, TypeDef};

fn description(out: &mut String, indent: &str, text: Option<&str>) {
    if let Some(text) = text {
        let _ = writeln!(out, "{indent}\"\"\"{text}\"\"\"");
    }
}

fn argument(def: &ArgumentDef) -> String {
    match &def.default {
        Some(value) => format!("{}: {} = {}", def.name, def.ty, value.to_json()),
        None => format!("{}: {}", def.name, def.ty),
    }
}

pub(crate) fn render<S, C>(schema: &Schema<S, C>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "schema {{");
    let _ = writeln!(out, "  query: {}", schema.query_name());
    if let Some(mutation) = schema.mutation_name() {
        let _ = writeln!(out, "  mutation: {mutation}");
    }
    let _ = writeln!(out, "}}");

    for name in schema.type_names() {
        out.push('\n');
        match schema.type_def(name) {
            Some(TypeDef::Object(object)) => {
                description(&mut out, "", object.description.as_deref());
                let _ = writeln!(out, "type {name} {{");
                for field in object.fields() {
                    description(&mut out, "  ", field.description.as_deref());
                    let args = field.arguments().iter().map(argument).collect::<Vec<_>>();
                    if args.is_empty() {
                        let _ = writeln!(out, "  {}: {}", field.name(), field.ty());
                    } else {
                        let _ = writeln!(out, "  {}({}): {}", field.name(), args.join(", "), field.ty());
                    }
                }
                let _ = writeln!(out, "}}");
            }
            Some(TypeDef::InputObject(input)) => {
                description(&mut out, "", input.description.as_deref());
                let _ = writeln!(out, "input {name} {{");
                for field in input.fields() {
                    description(&mut out, "  ", field.description.as_deref());
                    let _ = writeln!(out, "  {}", argument(field));
                }
                let _ = writeln!(out, "}}");
            }
            Some(TypeDef::Scalar(_)) | None => {}
        }
    }

    out
}
