//! ARFF header and data-row parsing. Data rows become dense value vectors:
//! nominal labels map to their domain index and `?` maps to NaN.

use crate::core::attributes::{Attribute, AttributeRef, NominalAttribute, NumericAttribute};
use crate::core::instance_header::InstanceHeader;
use crate::utils::file_parsing::{split_csv_preserving_quotes, strip_surrounding_quotes};
use std::io::{BufRead, Error, ErrorKind};
use std::sync::Arc;

#[derive(Debug, PartialEq)]
pub(super) enum AttributeKind {
    Numeric,
    Nominal(Vec<String>),
}

#[derive(Debug, PartialEq)]
enum Directive {
    Relation(String),
    Attribute(String, AttributeKind),
    Data,
}

pub(super) fn is_comment_or_empty(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.starts_with('%')
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidData, msg.into())
}

/// Text after `keyword` when `line` starts with it, ignoring ASCII case.
fn after_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..keyword.len())?;
    head.eq_ignore_ascii_case(keyword)
        .then(|| &line[keyword.len()..])
}

fn parse_directive(line: &str) -> Result<Directive, Error> {
    let line = line.trim();
    if let Some(rest) = after_keyword(line, "@relation") {
        let name = strip_surrounding_quotes(rest.trim());
        return Ok(Directive::Relation(name.to_string()));
    }
    if let Some(rest) = after_keyword(line, "@attribute") {
        let (name, kind) = parse_attribute_decl(rest.trim())?;
        return Ok(Directive::Attribute(name, kind));
    }
    if after_keyword(line, "@data").is_some() {
        return Ok(Directive::Data);
    }
    Err(invalid(format!("unsupported header directive: {line}")))
}

/// Consumes lines up to and including `@data`. `class_index` defaults to the
/// last attribute.
pub(super) fn parse_header<R: BufRead>(
    reader: &mut R,
    class_index: Option<usize>,
) -> Result<InstanceHeader, Error> {
    let mut relation = None;
    let mut attributes: Vec<AttributeRef> = Vec::new();
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                "ARFF file ended before @data",
            ));
        }
        if is_comment_or_empty(&line) {
            continue;
        }

        match parse_directive(&line)? {
            Directive::Relation(name) => relation = Some(name),
            Directive::Attribute(name, AttributeKind::Numeric) => {
                attributes.push(Arc::new(NumericAttribute::new(name)));
            }
            Directive::Attribute(name, AttributeKind::Nominal(values)) => {
                attributes.push(Arc::new(NominalAttribute::with_values(name, values)));
            }
            Directive::Data => break,
        }
    }

    let Some(last) = attributes.len().checked_sub(1) else {
        return Err(invalid("ARFF header declares no attributes"));
    };
    let class_index = class_index.unwrap_or(last);
    if class_index > last {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!(
                "class index {class_index} out of range for {} attributes",
                attributes.len()
            ),
        ));
    }

    Ok(InstanceHeader::new(
        relation.unwrap_or_else(|| "unnamed_relation".to_string()),
        attributes,
        class_index,
    ))
}

/// Parses what follows `@attribute`: a possibly quoted name, then a type.
pub(super) fn parse_attribute_decl(decl: &str) -> Result<(String, AttributeKind), Error> {
    let (name, type_spec) = split_attribute_name(decl)?;
    let type_spec = type_spec.trim();

    let lower = type_spec.to_ascii_lowercase();
    if ["numeric", "real", "integer"]
        .iter()
        .any(|t| lower.starts_with(t))
    {
        return Ok((name, AttributeKind::Numeric));
    }

    if let Some(body) = type_spec.strip_prefix('{') {
        let close = body
            .rfind('}')
            .ok_or_else(|| invalid("nominal domain without closing '}'"))?;
        let values: Vec<String> = body[..close]
            .split(',')
            .map(|v| strip_surrounding_quotes(v.trim()))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        if values.is_empty() {
            return Err(invalid("empty nominal domain"));
        }
        return Ok((name, AttributeKind::Nominal(values)));
    }

    Err(invalid(format!("attribute type not supported: {type_spec}")))
}

fn split_attribute_name(decl: &str) -> Result<(String, &str), Error> {
    match decl.chars().next() {
        Some(quote @ ('\'' | '"')) => {
            let body = &decl[1..];
            let end = body
                .find(quote)
                .ok_or_else(|| invalid("attribute name without closing quote"))?;
            Ok((body[..end].to_string(), &body[end + 1..]))
        }
        _ => {
            let (name, rest) = decl
                .split_once(char::is_whitespace)
                .ok_or_else(|| invalid("attribute type is missing"))?;
            Ok((name.to_string(), rest))
        }
    }
}

pub(super) fn parse_instance_values(
    header: &InstanceHeader,
    line: &str,
) -> Result<Vec<f64>, Error> {
    let cells = split_csv_preserving_quotes(line);
    if cells.len() != header.attributes.len() {
        return Err(invalid(format!(
            "row has {} columns, header declares {} attributes",
            cells.len(),
            header.attributes.len()
        )));
    }

    header
        .attributes
        .iter()
        .zip(&cells)
        .enumerate()
        .map(|(idx, (attr, cell))| {
            parse_cell(attr.as_ref(), cell.trim())
                .map_err(|reason| invalid(format!("column {idx}: {reason}")))
        })
        .collect()
}

fn parse_cell(attr: &dyn Attribute, raw: &str) -> Result<f64, String> {
    if raw == "?" {
        return Ok(f64::NAN);
    }

    let any = attr.as_any();
    if any.is::<NumericAttribute>() {
        return raw
            .parse()
            .map_err(|_| format!("invalid numeric value '{raw}'"));
    }
    if let Some(nominal) = any.downcast_ref::<NominalAttribute>() {
        let label = strip_surrounding_quotes(raw);
        return nominal
            .index_of_value(label)
            .map(|i| i as f64)
            .ok_or_else(|| format!("'{label}' is not in the domain of {}", nominal.name()));
    }
    Err(format!("unsupported attribute type for {}", attr.name()))
}
