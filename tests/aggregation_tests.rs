//! End-to-end tests for source aggregation and typed binding

use confstack::{
    ConfigError, ConfigNode, DeclaredVariable, DetectedOption, EmbeddedResources, Environment,
    FolderResource, OptionBinding, PolymorphicRegistry, ResourceLocator, SourceAggregator,
};
use confstack::bind::{Bytes, Duration, Percent};
use serde::Deserialize;
use serde_json::json;
use similar_asserts::assert_eq;
use std::fs;
use tempfile::TempDir;

fn locator(entries: &[(&str, &str)]) -> ResourceLocator {
    let embedded = entries
        .iter()
        .fold(EmbeddedResources::new(), |acc, (path, body)| acc.with(*path, *body));
    ResourceLocator::new(embedded)
}

fn file(dir: &TempDir, name: &str, body: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, body).expect("write fixture");
    path.to_str().expect("utf8 path").to_string()
}

#[test]
fn test_default_and_explicit_resources_without_overlap() {
    let dir = TempDir::new().unwrap();
    let explicit = file(&dir, "server.yml", "server:\n  port: 8080\n");

    let tree = SourceAggregator::new(locator(&[("defaults.yml", "timeout: 30\n")]))
        .default_resource("classpath:defaults.yml")
        .config(explicit)
        .resolve_tree()
        .unwrap();
    assert_eq!(tree, ConfigNode::from(json!({"timeout": 30, "server": {"port": 8080}})));
}

#[test]
fn test_config_order_decides_overlapping_keys() {
    let dir = TempDir::new().unwrap();
    let f1 = file(&dir, "f1.yml", "a: b\n");
    let f2 = file(&dir, "f2.yml", "c: d\n");
    let f3 = file(&dir, "f3.json", r#"{"a": "from-json"}"#);

    let forward = SourceAggregator::new(locator(&[]))
        .configs([f1.clone(), f2.clone()])
        .resolve_tree()
        .unwrap();
    assert_eq!(forward, ConfigNode::from(json!({"a": "b", "c": "d"})));

    let later_wins = SourceAggregator::new(locator(&[]))
        .configs([f1.clone(), f3.clone()])
        .resolve_tree()
        .unwrap();
    assert_eq!(later_wins.get("a"), Some(&ConfigNode::from("from-json")));

    let earlier_loses = SourceAggregator::new(locator(&[]))
        .configs([f3, f1])
        .resolve_tree()
        .unwrap();
    assert_eq!(earlier_loses.get("a"), Some(&ConfigNode::from("b")));
}

#[test]
fn test_full_precedence_chain() {
    let dir = TempDir::new().unwrap();
    let explicit = file(
        &dir,
        "app.yml",
        "v1: config\nv2: config\nv3: config\nv4: config\n",
    );
    let env = Environment::new()
        .property("bq.v3", "property")
        .property("bq.v4", "property")
        .variable("BQ_V4", "variable");

    let factory = SourceAggregator::new(locator(&[(
        "defaults.yml",
        "v0: default\nv1: default\nv2: default\n",
    )]))
    .default_resource("classpath:defaults.yml")
    .config(explicit)
    .option_binding(OptionBinding::path("opt", "v2"))
    .detected_options([DetectedOption::with_value("opt", "option")])
    .environment(env)
    .resolve()
    .unwrap();

    assert_eq!(
        factory.root(),
        &ConfigNode::from(json!({
            "v0": "default",
            "v1": "config",
            "v2": "option",
            "v3": "property",
            "v4": "variable"
        }))
    );
}

#[test]
fn test_environment_variable_binds_into_typed_config() {
    #[derive(Debug, Deserialize)]
    struct DataSource {
        url: String,
        #[serde(default)]
        user: Option<String>,
    }

    let factory = SourceAggregator::new(locator(&[("db.yml", "jdbc:\n  mydb:\n    user: sa\n")]))
        .default_resource("classpath:db.yml")
        .environment(Environment::new().variable("BQ_JDBC_MYDB_URL", "jdbc:mysql://localhost/db"))
        .resolve()
        .unwrap();

    let ds: DataSource = factory.config("jdbc.mydb").unwrap();
    assert_eq!(ds.url, "jdbc:mysql://localhost/db");
    assert_eq!(ds.user.as_deref(), Some("sa"));
}

#[test]
fn test_alias_conflict_aborts_resolution() {
    let env = Environment::new().variable("BQ_DB_URL", "one").variable("DATABASE_URL", "two");
    let err = SourceAggregator::new(locator(&[]))
        .environment(env)
        .declare_variable(DeclaredVariable::new("db.url").alias("DATABASE_URL"))
        .resolve_tree()
        .unwrap_err();
    assert!(matches!(err, ConfigError::AliasConflict { ref path, .. } if path == "db.url"));
}

#[test]
fn test_option_injected_resource() {
    let tree = SourceAggregator::new(locator(&[("profiles/debug.yml", "log:\n  level: debug\n")]))
        .option_binding(OptionBinding::resource("debug", "classpath:profiles/debug.yml"))
        .detected_options([DetectedOption::flag("debug")])
        .resolve_tree()
        .unwrap();
    assert_eq!(tree, ConfigNode::from(json!({"log": {"level": "debug"}})));
}

#[test]
fn test_folder_resource_combines_with_sub_paths() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("conf")).unwrap();
    file(&dir, "conf/app.yml", "name: folder\n");

    let folder = FolderResource::new(&format!("{}/conf", dir.path().display())).unwrap();
    let tree = SourceAggregator::new(locator(&[]))
        .config(folder.resolve("/app.yml"))
        .resolve_tree()
        .unwrap();
    assert_eq!(tree.get("name"), Some(&ConfigNode::from("folder")));
}

#[test]
fn test_unparseable_resource_is_access_error() {
    let dir = TempDir::new().unwrap();
    let broken = file(&dir, "broken.json", "{\"a\": [1,");
    let err = SourceAggregator::new(locator(&[])).config(broken.clone()).resolve_tree().unwrap_err();
    assert!(matches!(err, ConfigError::ResourceAccess { ref id, .. } if *id == broken));
}

trait Transport {
    fn describe(&self) -> String;
}

#[derive(Deserialize)]
struct Tcp {
    port: u16,
}

#[derive(Deserialize)]
struct Udp {
    port: u16,
    #[serde(default)]
    multicast: bool,
}

#[derive(Deserialize)]
struct Loopback {}

impl Transport for Tcp {
    fn describe(&self) -> String {
        format!("tcp:{}", self.port)
    }
}

impl Transport for Udp {
    fn describe(&self) -> String {
        format!("udp:{}:{}", self.port, self.multicast)
    }
}

impl Transport for Loopback {
    fn describe(&self) -> String {
        "loopback".to_string()
    }
}

fn transports() -> PolymorphicRegistry<dyn Transport> {
    PolymorphicRegistry::new("type")
        .register("type1", |t: Tcp| Box::new(t) as Box<dyn Transport>)
        .register("type2", |u: Udp| Box::new(u) as Box<dyn Transport>)
}

#[test]
fn test_polymorphic_binding_selects_registered_type() {
    let factory = SourceAggregator::new(locator(&[(
        "net.yml",
        "net:\n  type: type2\n  port: 53\n",
    )]))
    .default_resource("classpath:net.yml")
    .environment(Environment::new().property("bq.net.multicast", "true"))
    .resolve()
    .unwrap();

    let transport = factory.polymorphic_config("net", &transports()).unwrap();
    assert_eq!(transport.describe(), "udp:53:true");
}

#[test]
fn test_polymorphic_binding_default_and_unknown() {
    let factory = SourceAggregator::new(locator(&[(
        "net.yml",
        "plain:\n  port: 1\nodd:\n  type: type9\n",
    )]))
    .default_resource("classpath:net.yml")
    .resolve()
    .unwrap();

    let with_default = transports().with_default(|l: Loopback| Box::new(l) as Box<dyn Transport>);
    assert_eq!(factory.polymorphic_config("plain", &with_default).unwrap().describe(), "loopback");

    match factory.polymorphic_config("odd", &transports()) {
        Err(ConfigError::UnknownPolymorphicType { value, .. }) => {
            assert_eq!(value.as_deref(), Some("type9"))
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(t) => panic!("unexpected transport: {}", t.describe()),
    }
}

#[test]
fn test_list_binding() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Endpoint {
        host: String,
        port: u16,
    }

    let factory = SourceAggregator::new(locator(&[(
        "endpoints.yml",
        "endpoints:\n  - host: a\n    port: 1\n",
    )]))
    .default_resource("classpath:endpoints.yml")
    .environment(
        Environment::new()
            .property("bq.endpoints[1].host", "b")
            .property("bq.endpoints[1].port", "2"),
    )
    .resolve()
    .unwrap();

    let endpoints: Vec<Endpoint> = factory.config("endpoints").unwrap();
    assert_eq!(
        endpoints,
        vec![
            Endpoint { host: "a".into(), port: 1 },
            Endpoint { host: "b".into(), port: 2 },
        ]
    );
}

#[test]
fn test_unit_values_bind_from_documents_and_overrides() {
    #[derive(Debug, Deserialize)]
    struct Limits {
        timeout: Duration,
        buffer: Bytes,
        threshold: Percent,
    }

    let factory = SourceAggregator::new(locator(&[(
        "limits.yml",
        "x:\n  timeout: 5 sec\n  buffer: 10 KB\n  threshold: 0.25\n",
    )]))
    .default_resource("classpath:limits.yml")
    .environment(Environment::new().property("bq.x.timeout", "5ms"))
    .resolve()
    .unwrap();

    let limits: Limits = factory.config("x").unwrap();
    assert_eq!(limits.timeout, Duration::from_millis(5));
    assert_eq!(limits.buffer.bytes(), 10_240);
    assert_eq!(limits.threshold.percent(), 25.0);

    let err = SourceAggregator::new(locator(&[]))
        .environment(Environment::new().property("bq.x.timeout", "5 fortnights"))
        .resolve()
        .unwrap()
        .config::<Duration>("x.timeout")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Bind { ref prefix, .. } if prefix == "x.timeout"));
}
