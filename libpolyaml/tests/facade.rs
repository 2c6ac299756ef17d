//! Typed binding through the `Yaml` facade: naming conventions, enum
//! transcoding and tagged-union resolution.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use libpolyaml::{
    from_str, to_string, Error, NamingConvention, RegistryError, ResolutionPolicy, Underscored,
    Variant, Yaml,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
enum Protocol {
    Http,
    Socks5,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Listener {
    protocol: Option<Protocol>,
    port: u16,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Student {
    r#type: String,
    name: String,
    grade: u8,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Teacher {
    r#type: String,
    name: String,
    subject: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Person {
    Student(Student),
    Teacher(Teacher),
}

fn people() -> Yaml {
    Yaml::builder()
        .union(
            "Person",
            [
                Variant::new("Student", "Type", "Student"),
                Variant::new("Teacher", "Type", "Teacher"),
            ],
        )
        .build()
        .unwrap()
}

#[test]
fn test_union_selects_variant_by_discriminant() {
    let person: Person = people()
        .deserialize("type: Student\nname: Ann\ngrade: 3\n")
        .unwrap();
    assert_eq!(
        person,
        Person::Student(Student {
            r#type: "Student".into(),
            name: "Ann".into(),
            grade: 3,
        })
    );

    let person: Person = people()
        .deserialize("name: Bo\nsubject: maths\ntype: Teacher\n")
        .unwrap();
    assert!(matches!(person, Person::Teacher(Teacher { ref subject, .. }) if subject == "maths"));
}

#[test]
fn test_union_without_matching_variant() {
    let err = people().deserialize::<Person>("{type: Unknown}").unwrap_err();
    assert_eq!(err.to_string(), "Could not find variant for type Person");
    match err {
        Error::UnionResolution { type_name, text } => {
            assert_eq!(type_name, "Person");
            assert_eq!(text, "type: Unknown\n");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_union_ignores_order_of_non_matching_variants() {
    let reversed = Yaml::builder()
        .union(
            "Person",
            [
                Variant::new("Teacher", "Type", "Teacher"),
                Variant::new("Student", "Type", "Student"),
            ],
        )
        .build()
        .unwrap();
    let text = "type: Student\nname: Ann\ngrade: 3\n";
    assert_eq!(
        reversed.deserialize::<Person>(text).unwrap(),
        people().deserialize::<Person>(text).unwrap()
    );
}

#[test]
fn test_union_serializes_bare_payload() {
    let person = Person::Teacher(Teacher {
        r#type: "Teacher".into(),
        name: "Bo".into(),
        subject: "maths".into(),
    });
    let text = people().serialize(&person).unwrap();
    assert_eq!(text, "type: Teacher\nname: Bo\nsubject: maths\n");
    assert_eq!(people().deserialize::<Person>(&text).unwrap(), person);
}

#[test]
fn test_union_requires_mapping() {
    let err = people().deserialize::<Person>("- Ann\n").unwrap_err();
    assert!(matches!(err, Error::UnionShape { found: "sequence", .. }));

    let err = people().deserialize::<Person>("Ann").unwrap_err();
    assert_eq!(err.to_string(), "Union Person expects a mapping, found scalar");
}

#[test]
fn test_optional_union_reads_null_as_none() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Class {
        monitor: Option<Person>,
        teacher: Option<Person>,
    }

    let class: Class = people().deserialize("monitor: ~\n").unwrap();
    assert_eq!(class, Class { monitor: None, teacher: None });
}

#[test]
fn test_unresolved_item_aborts_whole_call() {
    let text = "- type: Student\n  name: Ann\n  grade: 3\n- type: Janitor\n  name: Cy\n";
    let err = people().deserialize::<Vec<Person>>(text).unwrap_err();
    assert!(matches!(err, Error::UnionResolution { .. }));
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Shape {
    Circle { radius: f64 },
    Group { name: String, members: Vec<Shape> },
}

#[test]
fn test_nested_unions_resolve_recursively() {
    let yaml = Yaml::builder()
        .union(
            "Shape",
            [
                Variant::new("Circle", "kind", "circle"),
                Variant::new("Group", "kind", "group"),
            ],
        )
        .build()
        .unwrap();
    let shape = Shape::Group {
        name: "outer".into(),
        members: vec![
            Shape::Circle { radius: 1.5 },
            Shape::Group {
                name: "inner".into(),
                members: vec![],
            },
        ],
    };

    let text = yaml.serialize(&shape).unwrap();
    assert_eq!(
        text,
        "kind: group\n\
         name: outer\n\
         members:\n  \
           - kind: circle\n    \
             radius: 1.5\n  \
           - kind: group\n    \
             name: inner\n    \
             members: []\n"
    );
    assert_eq!(yaml.deserialize::<Shape>(&text).unwrap(), shape);
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Target {
    proxy: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Rule {
    Match(Target),
    Final,
}

#[test]
fn test_union_unit_variant_writes_discriminant() {
    let yaml = Yaml::builder()
        .union(
            "Rule",
            [
                Variant::new("Match", "kind", "match"),
                Variant::new("Final", "kind", "final"),
            ],
        )
        .build()
        .unwrap();
    let rules = vec![Rule::Match(Target { proxy: "hk-01".into() }), Rule::Final];

    let text = yaml.serialize(&rules).unwrap();
    assert_eq!(text, "- kind: match\n  proxy: hk-01\n- kind: final\n");
    assert_eq!(yaml.deserialize::<Vec<Rule>>(&text).unwrap(), rules);
}

#[derive(Deserialize, Debug, PartialEq)]
struct Port {
    port: u16,
}

#[derive(Deserialize, Debug, PartialEq)]
enum Endpoint {
    Tcp(Port),
    Udp(Port),
}

fn endpoints(policy: ResolutionPolicy) -> Yaml {
    Yaml::builder()
        .union(
            "Endpoint",
            [
                Variant::new("Tcp", "kind", "tcp"),
                Variant::new("Udp", "proto", "udp"),
            ],
        )
        .resolution_policy(policy)
        .build()
        .unwrap()
}

#[test]
fn test_first_match_policy_takes_first_registered() {
    let text = "kind: tcp\nproto: udp\nport: 53\n";
    let endpoint: Endpoint = endpoints(ResolutionPolicy::FirstMatch).deserialize(text).unwrap();
    assert_eq!(endpoint, Endpoint::Tcp(Port { port: 53 }));
}

#[test]
fn test_unique_match_policy_rejects_ambiguity() {
    let yaml = endpoints(ResolutionPolicy::UniqueMatch);
    let err = yaml
        .deserialize::<Endpoint>("kind: tcp\nproto: udp\nport: 53\n")
        .unwrap_err();
    match err {
        Error::UnionAmbiguity { variants, .. } => assert_eq!(variants, ["Tcp", "Udp"]),
        other => panic!("unexpected error {:?}", other),
    }

    let endpoint: Endpoint = yaml.deserialize("proto: udp\nport: 53\n").unwrap();
    assert_eq!(endpoint, Endpoint::Udp(Port { port: 53 }));
}

#[test]
fn test_union_registration_errors() {
    let err = Yaml::builder()
        .union("Tag", [Variant::new("A", "type", "x"), Variant::new("B", "Type", "x")])
        .build()
        .unwrap_err();
    assert!(matches!(err, RegistryError::IndistinguishableVariants { .. }));

    let err = Yaml::builder().union("Tag", []).build().unwrap_err();
    assert_eq!(err, RegistryError::EmptyUnion("Tag".into()));
}

#[test]
fn test_union_payload_must_serialize_to_mapping() {
    #[derive(Serialize)]
    enum Label {
        Name(String),
    }

    let yaml = Yaml::builder()
        .union("Label", [Variant::new("Name", "type", "name")])
        .build()
        .unwrap();
    let err = yaml.serialize(&Label::Name("x".into())).unwrap_err();
    assert!(matches!(err, Error::UnionShape { found: "scalar", .. }));
}

#[test]
fn test_enum_values_are_transcoded() {
    assert_eq!(to_string(&Protocol::Http).unwrap(), "http\n");
    assert_eq!(from_str::<Protocol>("socks5").unwrap(), Protocol::Socks5);
    assert_eq!(from_str::<Protocol>("Socks5").unwrap(), Protocol::Socks5);

    let err = from_str::<Protocol>("ftp").unwrap_err();
    assert_eq!(err.to_string(), "Value 'ftp' not found in enum Protocol");
    assert!(matches!(err, Error::Decode { ref value, .. } if value == "ftp"));
}

#[test]
fn test_absent_enum_value_is_null() {
    let listener = Listener {
        protocol: None,
        port: 80,
    };
    let text = to_string(&listener).unwrap();
    assert_eq!(text, "protocol: null\nport: 80\n");
    assert_eq!(from_str::<Listener>(&text).unwrap(), listener);

    let err = from_str::<Protocol>("null").unwrap_err();
    assert!(matches!(err, Error::Decode { ref value, .. } if value == "null"));
}

#[test]
fn test_registered_enumeration_reads_both_names() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum EnhancedMode {
        FakeIp,
        RedirHost,
    }

    let yaml = Yaml::builder().enumeration::<EnhancedMode>().build().unwrap();
    assert_eq!(yaml.serialize(&EnhancedMode::FakeIp).unwrap(), "fake-ip\n");
    assert_eq!(yaml.deserialize::<EnhancedMode>("redir-host").unwrap(), EnhancedMode::RedirHost);
    assert_eq!(yaml.deserialize::<EnhancedMode>("RedirHost").unwrap(), EnhancedMode::RedirHost);
    assert!(yaml.deserialize::<EnhancedMode>("redir_host").is_err());
}

#[test]
fn test_blank_enum_name_cannot_be_written() {
    #[derive(Debug)]
    struct Blank;

    impl NamingConvention for Blank {
        fn apply(&self, _name: &str) -> String {
            String::new()
        }
    }

    let yaml = Yaml::builder().naming_convention(Blank).build().unwrap();
    let err = yaml.serialize(&Protocol::Http).unwrap_err();
    assert_eq!(err.to_string(), "Cannot write Protocol::Http to yaml");
}

#[test]
fn test_externally_tagged_enums() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Action {
        Reject,
        Route(String),
        Weighted(String, u8),
    }

    let actions = vec![
        Action::Reject,
        Action::Route("hk-01".into()),
        Action::Weighted("local".into(), 3),
    ];
    let text = to_string(&actions).unwrap();
    assert_eq!(text, "- reject\n- route: hk-01\n- weighted:\n    - local\n    - 3\n");
    assert_eq!(from_str::<Vec<Action>>(&text).unwrap(), actions);
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Settings {
    allow_lan: bool,
    mixed_port: u16,
    max_retry_count: Option<u32>,
    extra_headers: BTreeMap<String, String>,
}

fn settings() -> Settings {
    Settings {
        allow_lan: true,
        mixed_port: 7890,
        max_retry_count: Some(3),
        extra_headers: [("User_Agent".to_string(), "clash".to_string())].into(),
    }
}

#[test]
fn test_field_names_follow_convention() {
    let text = to_string(&settings()).unwrap();
    assert_eq!(
        text,
        "allow-lan: true\nmixed-port: 7890\nmax-retry-count: 3\nextra-headers:\n  User_Agent: clash\n"
    );
    assert_eq!(from_str::<Settings>(&text).unwrap(), settings());

    let yaml = Yaml::builder().naming_convention(Underscored).build().unwrap();
    let text = yaml.serialize(&settings()).unwrap();
    assert!(text.starts_with("allow_lan: true\nmixed_port: 7890\n"));
    assert_eq!(yaml.deserialize::<Settings>(&text).unwrap(), settings());
}

#[test]
fn test_fields_match_raw_or_converted_names() {
    let text = "allow_lan: true\nmixed-port: 7890\nmax_retry_count: 3\nunknown-key: ignored\nextra-headers:\n  User_Agent: clash\n";
    assert_eq!(from_str::<Settings>(text).unwrap(), settings());
}

#[derive(Serialize, Debug)]
struct Retry {
    max_retry: u8,
    #[serde(rename = "MaxRetry")]
    other: u8,
}

#[test]
fn test_fields_sharing_a_key_are_rejected() {
    let err = to_string(&Retry { max_retry: 1, other: 2 }).unwrap_err();
    assert!(matches!(err, Error::Message(_)), "{err:?}");
    assert_eq!(
        err.to_string(),
        "fields max_retry and MaxRetry both serialize as key max-retry"
    );

    let verbatim = Yaml::builder()
        .naming_convention(libpolyaml::Verbatim)
        .build()
        .unwrap();
    assert_eq!(
        verbatim.serialize(&Retry { max_retry: 1, other: 2 }).unwrap(),
        "max_retry: 1\nMaxRetry: 2\n"
    );
}

#[test]
fn test_scalar_binding() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Numbers {
        hex: u8,
        octal: u16,
        negative: i32,
        ratio: f64,
        infinite: f64,
        flag: bool,
    }

    let numbers: Numbers =
        from_str("hex: 0x1F\noctal: 0o17\nnegative: -42\nratio: 1e3\ninfinite: -.inf\nflag: True\n")
            .unwrap();
    assert_eq!(
        numbers,
        Numbers {
            hex: 31,
            octal: 15,
            negative: -42,
            ratio: 1000.0,
            infinite: f64::NEG_INFINITY,
            flag: true,
        }
    );

    assert_eq!(to_string(&1.0f64).unwrap(), "1.0\n");
    assert_eq!(to_string(&2.5f32).unwrap(), "2.5\n");
    assert_eq!(to_string(&f64::NAN).unwrap(), ".nan\n");
    assert_eq!(to_string(&f64::INFINITY).unwrap(), ".inf\n");
}

#[test]
fn test_binding_errors() {
    let err = from_str::<Settings>("allow-lan: maybe\nmixed-port: 1\nextra-headers: {}\n").unwrap_err();
    assert_eq!(err.to_string(), "invalid value: string \"maybe\", expected a boolean");

    let err = from_str::<Settings>("allow-lan: true\n").unwrap_err();
    assert_eq!(err.to_string(), "missing field `mixed_port`");

    let err = from_str::<u8>("256").unwrap_err();
    assert!(matches!(err, Error::Message(_)));

    let err = from_str::<Settings>("allow-lan: [true\n").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn test_null_marker_and_null_text_stay_distinct() {
    assert_eq!(to_string(&"null").unwrap(), "\"null\"\n");
    assert_eq!(from_str::<Option<String>>("\"null\"").unwrap(), Some("null".to_string()));
    assert_eq!(from_str::<Option<String>>("null").unwrap(), None);
    assert_eq!(from_str::<Option<String>>("~").unwrap(), None);
}

#[test]
fn test_shared_across_threads() {
    let yaml = people();
    std::thread::scope(|scope| {
        for grade in 1..=4u8 {
            let yaml = yaml.clone();
            scope.spawn(move || {
                let text = format!("type: Student\nname: Ann\ngrade: {}\n", grade);
                let person: Person = yaml.deserialize(&text).unwrap();
                assert_eq!(yaml.serialize(&person).unwrap(), text);
            });
        }
    });
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Mode {
    Rule,
    Global,
    Direct,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum LogLevel {
    Silent,
    Error,
    Warning,
    Info,
    Debug,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum EnhancedMode {
    FakeIp,
    RedirHost,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Dns {
    enable: bool,
    enhanced_mode: Option<EnhancedMode>,
    nameserver: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Shadowsocks {
    name: String,
    server: String,
    port: u16,
    cipher: String,
    password: String,
    udp: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Socks5 {
    name: String,
    server: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Http {
    name: String,
    server: String,
    port: u16,
    tls: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Proxy {
    Shadowsocks(Shadowsocks),
    Socks5(Socks5),
    Http(Http),
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ClashConfig {
    mixed_port: u16,
    allow_lan: bool,
    mode: Mode,
    log_level: LogLevel,
    external_controller: Option<String>,
    dns: Dns,
    proxies: Vec<Proxy>,
    rules: Vec<String>,
}

fn clash() -> Yaml {
    Yaml::builder()
        .union(
            "Proxy",
            [
                Variant::new("Shadowsocks", "type", "ss"),
                Variant::new("Socks5", "type", "socks5"),
                Variant::new("Http", "type", "http"),
            ],
        )
        .enumeration::<Mode>()
        .enumeration::<LogLevel>()
        .build()
        .unwrap()
}

#[test]
fn test_clash_config_round_trip() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test/clash/config.yaml");
    let source = fs::read_to_string(path).unwrap();

    let yaml = clash();
    let config: ClashConfig = yaml.deserialize(&source).unwrap();
    assert_eq!(config.mode, Mode::Rule);
    assert_eq!(config.log_level, LogLevel::Warning);
    assert_eq!(config.dns.enhanced_mode, Some(EnhancedMode::FakeIp));
    assert_eq!(config.proxies.len(), 3);
    assert!(matches!(
        &config.proxies[0],
        Proxy::Shadowsocks(Shadowsocks { password, udp: Some(true), .. }) if password == "p@ss: word"
    ));
    assert!(matches!(
        &config.proxies[1],
        Proxy::Socks5(Socks5 { port: 1080, username: None, .. })
    ));
    assert!(matches!(&config.proxies[2], Proxy::Http(Http { tls: false, .. })));

    let text = yaml.serialize(&config).unwrap();
    assert!(text.contains("proxies:\n  - type: ss\n    name: hk-01\n"));
    assert!(text.contains("  - type: socks5\n    name: local\n"));
    assert!(text.contains("log-level: warning\n"));
    assert_eq!(yaml.deserialize::<ClashConfig>(&text).unwrap(), config);
}
