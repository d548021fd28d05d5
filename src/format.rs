//! Rendering for `| format csv` and `| format table`.

use indexmap::IndexMap;

use crate::ast::OutputFormat;
use crate::interpreter::error::ErrorKind;
use crate::value::Value;

pub fn render(value: &Value, format: OutputFormat) -> Result<String, ErrorKind> {
    match format {
        OutputFormat::Csv => Ok(render_csv(value)),
        OutputFormat::Table => render_table(value),
    }
}

/// Rows of a tabular value: column names in first-seen order plus cell text.
struct Rows {
    columns: Vec<String>,
    cells: Vec<Vec<String>>,
    /// False for plain lists, whose CSV form is one value per line.
    header: bool,
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.inspect(),
    }
}

fn collect_records(records: &[IndexMap<String, Value>]) -> Rows {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    let cells = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|col| record.get(col).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();
    Rows {
        columns,
        cells,
        header: true,
    }
}

/// Lists of hashes become one row per hash; lists of anything else become a
/// single `value` column. A lone hash is a one-row table.
fn tabulate(value: &Value) -> Option<Rows> {
    match value {
        Value::Hash(map) => Some(collect_records(&[map.borrow().clone()])),
        Value::List(items) => {
            let items = items.borrow();
            let records: Option<Vec<IndexMap<String, Value>>> = items
                .iter()
                .map(|item| match item {
                    Value::Hash(map) => Some(map.borrow().clone()),
                    _ => None,
                })
                .collect();
            match records {
                Some(records) if !records.is_empty() => Some(collect_records(&records)),
                _ => Some(Rows {
                    columns: vec!["value".to_string()],
                    cells: items.iter().map(|item| vec![cell_text(item)]).collect(),
                    header: false,
                }),
            }
        }
        _ => None,
    }
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_line(fields: &[String]) -> String {
    fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",")
}

fn render_csv(value: &Value) -> String {
    let rows = match tabulate(value) {
        Some(rows) => rows,
        None => return csv_field(&cell_text(value)),
    };

    let mut lines = Vec::with_capacity(rows.cells.len() + 1);
    if rows.header {
        lines.push(csv_line(&rows.columns));
    }
    for row in &rows.cells {
        lines.push(csv_line(row));
    }
    lines.join("\n")
}

fn render_table(value: &Value) -> Result<String, ErrorKind> {
    let rows = tabulate(value).ok_or(ErrorKind::FormatNotSupported {
        type_name: value.type_name(),
        format: OutputFormat::Table,
    })?;

    let mut widths: Vec<usize> = rows.columns.iter().map(|c| c.chars().count()).collect();
    for row in &rows.cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let pad_line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut lines = Vec::with_capacity(rows.cells.len() + 2);
    lines.push(pad_line(&rows.columns));
    lines.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    for row in &rows.cells {
        lines.push(pad_line(row));
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, Value)]) -> Value {
        let mut map = IndexMap::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        Value::hash(map)
    }

    fn functions() -> Value {
        Value::list(vec![
            record(&[("name", Value::string("api")), ("memory", Value::Integer(128))]),
            record(&[("name", Value::string("worker, batch")), ("memory", Value::Integer(1024))]),
        ])
    }

    #[test]
    fn test_csv_records() {
        assert_eq!(
            render(&functions(), OutputFormat::Csv).unwrap(),
            "name,memory\napi,128\n\"worker, batch\",1024"
        );
    }

    #[test]
    fn test_csv_scalars() {
        let list = Value::list(vec![Value::Integer(1), Value::string("say \"hi\""), Value::Null]);
        assert_eq!(render(&list, OutputFormat::Csv).unwrap(), "1\n\"say \"\"hi\"\"\"\n");
        assert_eq!(render(&Value::Float(2.5), OutputFormat::Csv).unwrap(), "2.5");
    }

    #[test]
    fn test_csv_missing_columns_are_empty() {
        let list = Value::list(vec![
            record(&[("a", Value::Integer(1))]),
            record(&[("b", Value::Integer(2))]),
        ]);
        assert_eq!(render(&list, OutputFormat::Csv).unwrap(), "a,b\n1,\n,2");
    }

    #[test]
    fn test_table_records() {
        let expected = "\
name           memory
-------------  ------
api            128
worker, batch  1024";
        assert_eq!(render(&functions(), OutputFormat::Table).unwrap(), expected);
    }

    #[test]
    fn test_table_single_hash() {
        let row = record(&[("id", Value::Integer(7)), ("state", Value::string("running"))]);
        assert_eq!(
            render(&row, OutputFormat::Table).unwrap(),
            "id  state\n--  -------\n7   running"
        );
    }

    #[test]
    fn test_table_rejects_scalars() {
        let err = render(&Value::Integer(3), OutputFormat::Table).unwrap_err();
        assert_eq!(err.to_string(), "cannot format INTEGER as table");
    }
}
