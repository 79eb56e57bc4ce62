use crate::config::AppConfig;
use crate::error::AppResult;
use crate::output;
use crate::secret::{ApiSecret, SecretStore};

pub fn secret_lines(config: &AppConfig, secret: &ApiSecret) -> Vec<String> {
    vec![
        format!("Controller: {}", config.controller.base_url()),
        format!("Secret:     {}", secret.expose()),
    ]
}

/// `clashdock secret`: print the controller URL and the persisted token.
pub fn run(config: &AppConfig) -> AppResult<()> {
    let secret = SecretStore::new(&config.paths.secret_file).require()?;

    output::banner("🔑 Clash API secret");
    for line in secret_lines(config, &secret) {
        println!("{}", line);
    }
    println!();
    output::info("Enter both in the YACD dashboard to connect");
    Ok(())
}
