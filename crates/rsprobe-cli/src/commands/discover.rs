use super::{json_pretty, load_validated, Overrides, EXIT_DISCOVERY_ERROR, EXIT_SUCCESS};
use rsprobe_client::{discover, Discovery};
use serde::Serialize;

#[derive(Serialize)]
struct Row<'a> {
    server: &'a str,
    #[serde(flatten)]
    discovery: Option<Discovery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(overrides: &Overrides, json: bool) -> Result<u8, String> {
    let config = load_validated(overrides)?;

    let rows: Vec<Row<'_>> = config
        .servers
        .iter()
        .map(|server| match discover(server, &config.account) {
            Ok(d) => Row {
                server,
                discovery: Some(d),
                error: None,
            },
            Err(e) => Row {
                server,
                discovery: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    if json {
        println!("{}", json_pretty(&rows)?);
    } else {
        for row in &rows {
            println!("{}", row.server);
            if let Some(d) = &row.discovery {
                println!("  storage:       {}", d.href);
                match d.version {
                    Some(v) => println!("  version:       draft-dejong-remotestorage-{v:02}"),
                    None => println!("  version:       (not declared)"),
                }
                println!(
                    "  auth endpoint: {}",
                    d.auth_endpoint.as_deref().unwrap_or("(none)")
                );
            }
            if let Some(e) = &row.error {
                eprintln!("  error: {e}");
            }
        }
    }

    if rows.iter().any(|r| r.error.is_some()) {
        Ok(EXIT_DISCOVERY_ERROR)
    } else {
        Ok(EXIT_SUCCESS)
    }
}
