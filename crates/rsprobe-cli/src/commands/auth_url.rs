use super::{json_pretty, load_config, load_validated, Overrides, EXIT_SUCCESS};
use rsprobe_client::discover;
use rsprobe_core::{authorization_url, Permission};

pub fn run(
    overrides: &Overrides,
    permission: &str,
    redirect_uri: &str,
    endpoint: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let permission = permission
        .parse::<Permission>()
        .map_err(|e| e.to_string())?;

    let (config, endpoint) = match endpoint {
        Some(endpoint) => {
            let config = load_config(overrides)?;
            if config.account.is_empty() {
                return Err("config error: no account configured (set ACCOUNT or --account)".to_owned());
            }
            (config, endpoint.to_owned())
        }
        None => {
            let config = load_validated(overrides)?;
            let server = &config.servers[0];
            let discovery =
                discover(server, &config.account).map_err(|e| format!("discovery error: {e}"))?;
            let endpoint = discovery
                .auth_endpoint
                .ok_or_else(|| format!("discovery error: {server} announces no auth endpoint"))?;
            (config, endpoint)
        }
    };

    let url = authorization_url(&endpoint, &config.account, &config.scope, permission, redirect_uri)
        .map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "permission": permission,
            "scope": permission.scope(&config.scope),
            "env_var": permission.env_var(),
            "url": url,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{url}");
        eprintln!(
            "open the URL, grant access, and export the token as {}",
            permission.env_var()
        );
    }
    Ok(EXIT_SUCCESS)
}
