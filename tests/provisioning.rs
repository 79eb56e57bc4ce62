mod common;

use clashdock::document::{backup_files, URL_TEST_MARKER};
use clashdock::provision::Provisioner;
use clashdock::secret::SecretStore;
use clashdock::AppError;
use common::{config_in, temp_dir};
use serde_yaml::Value;
use std::fs;
use tokio_test::assert_ok;

const SUBSCRIPTION: &str = r#"
port: 1080
secret: subscription-secret
proxies:
  - {name: "HK 01", type: ss, server: hk.example.com, port: 443, cipher: aes-128-gcm, password: p}
  - {name: "Auto - UrlTest 1", type: ss, server: x.example.com, port: 443, cipher: aes-128-gcm, password: p}
proxy-groups:
  - name: Proxy
    type: select
    proxies: ["HK 01", "Auto - UrlTest"]
script:
  shortcuts: {}
rule-providers: {}
"#;

fn read_yaml(path: &std::path::Path) -> Value {
    serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn repeated_runs_reuse_the_secret_and_back_up() {
    let dir = temp_dir("provision");
    let config = config_in(&dir);
    let input = dir.join("sub.yaml");
    fs::write(&input, SUBSCRIPTION).unwrap();

    let first = assert_ok!(Provisioner::new(&config).provision(&input));
    let second = assert_ok!(Provisioner::new(&config).provision(&input));

    assert_eq!(first.secret, second.secret);
    assert!(first.backup.is_none());
    let backup = second.backup.expect("second run backs up the first output");
    assert_eq!(backup_files(&config.paths.output_config).unwrap(), vec![backup.clone()]);
    assert_eq!(read_yaml(&backup), read_yaml(&config.paths.output_config));

    let stored = SecretStore::new(&config.paths.secret_file).require().unwrap();
    assert_eq!(stored, first.secret);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn generated_document_is_container_ready() {
    let dir = temp_dir("provision");
    let config = config_in(&dir);
    let input = dir.join("sub.yaml");
    fs::write(&input, SUBSCRIPTION).unwrap();

    let outcome = Provisioner::new(&config).provision(&input).unwrap();
    let doc = read_yaml(&outcome.output);

    assert_eq!(doc["secret"].as_str(), Some(outcome.secret.expose()));
    assert_eq!(doc["port"].as_u64(), Some(7890));
    assert_eq!(doc["external-controller"].as_str(), Some("0.0.0.0:9090"));
    assert!(doc.get("script").is_none());
    assert!(doc.get("rule-providers").is_none());

    let proxies = doc["proxies"].as_sequence().unwrap();
    assert_eq!(proxies.len(), 1);
    let group = doc["proxy-groups"][0]["proxies"].as_sequence().unwrap();
    assert!(group.iter().all(|p| !p.as_str().unwrap().contains(URL_TEST_MARKER)));
    assert_eq!(
        doc["rules"].as_sequence().unwrap().last().and_then(Value::as_str),
        Some("MATCH,Proxy")
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_proxies_writes_nothing() {
    let dir = temp_dir("provision");
    let config = config_in(&dir);
    let input = dir.join("sub.yaml");
    fs::write(&input, "port: 7890\nproxy-groups: []\n").unwrap();

    let err = Provisioner::new(&config).provision(&input).unwrap_err();
    assert!(matches!(err, AppError::MissingField { field: "proxies", .. }));
    assert!(err.is_input());
    assert!(!config.paths.secret_file.exists());
    assert!(!config.paths.output_dir().exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_yaml_is_distinct_from_missing_field() {
    let dir = temp_dir("provision");
    let config = config_in(&dir);
    let input = dir.join("sub.yaml");
    fs::write(&input, "proxies: [\n  - {name: a\n").unwrap();

    let err = Provisioner::new(&config).provision(&input).unwrap_err();
    assert!(matches!(err, AppError::Yaml(_)));
    assert!(!config.paths.output_config.exists());

    let _ = fs::remove_dir_all(&dir);
}
