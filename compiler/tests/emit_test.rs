use std::sync::Arc;

use sdgen_compiler::{check_format, generate_definition, to_xsd, Language};
use sdgen_schema::{IntKind, Record, TypeDesc, WireFormat};

fn address() -> Arc<Record> {
    Record::builder("Address")
        .field("street", TypeDesc::string())
        .field("city", TypeDesc::string())
        .build()
        .unwrap()
}

fn person() -> Arc<Record> {
    let address = address();
    Record::builder("Person")
        .field("name", TypeDesc::string())
        .field("age", TypeDesc::optional(TypeDesc::int()))
        .field("hobbies", TypeDesc::list(TypeDesc::string()))
        .field("address", TypeDesc::record(&address))
        .field("badge", TypeDesc::fixed(IntKind::U16))
        .build()
        .unwrap()
}

/// Serializer and deserializer spellings each language uses on the root type.
fn conversion_pair(language: Language, format: WireFormat) -> (&'static str, &'static str) {
    use Language::*;
    use WireFormat::*;
    match (language, format) {
        (Cpp, Json)    => ("to_json_string(", "from_json_string("),
        (Cpp, Yaml)    => ("to_yaml_string(", "from_yaml_string("),
        (Cpp, Xml)     => ("to_xml(", "from_xml(const std::string&"),
        (Rust, Json)   => ("pub fn to_json(", "pub fn from_json("),
        (Rust, Yaml)   => ("pub fn to_yaml(", "pub fn from_yaml("),
        (Rust, Xml)    => ("pub fn to_xml(", "pub fn from_xml("),
        (Java, Json)   => ("toJson(", "fromJson("),
        (Java, Yaml)   => ("toYaml(", "fromYaml("),
        (Java, Xml)    => ("toXml(", "fromXml("),
        (Go, Json)     => ("ToJSON(", "PersonFromJSON("),
        (Go, Yaml)     => ("ToYAML(", "PersonFromYAML("),
        (Go, Xml)      => ("ToXML(", "PersonFromXML("),
        (CSharp, Json) => ("ToJson(", "FromJson("),
        (CSharp, Yaml) => ("ToYaml(", "FromYaml("),
        (CSharp, Xml)  => ("ToXml(", "FromXml("),
        (Swift, Json)  => ("toJSON(", "fromJSON("),
        (Swift, _)     => unreachable!("swift only generates JSON"),
    }
}

/// Exact member declaration lines for every field of Person and Address.
fn declarations(language: Language) -> Vec<&'static str> {
    match language {
        Language::Cpp => vec![
            "    std::string name{};",
            "    std::optional<int> age{};",
            "    std::vector<std::string> hobbies{};",
            "    Address address{};",
            "    uint16_t badge{};",
            "    std::string street{};",
            "    std::string city{};",
        ],
        Language::Rust => vec![
            "    pub name: String,",
            "    pub age: Option<i64>,",
            "    pub hobbies: Vec<String>,",
            "    pub address: Address,",
            "    pub badge: u16,",
            "    pub street: String,",
            "    pub city: String,",
        ],
        Language::Java => vec![
            "    public String name;",
            "    public Integer age;",
            "    public List<String> hobbies = new ArrayList<>();",
            "    public Address address;",
            "    public int badge;",
            "        public String street;",
            "        public String city;",
        ],
        Language::Go => vec![
            "\tName    string   `json:\"name\" yaml:\"name\" xml:\"name\"`",
            "\tAge     *int     `json:\"age,omitempty\" yaml:\"age,omitempty\" xml:\"age,omitempty\"`",
            "\tHobbies []string `json:\"hobbies\" yaml:\"hobbies\" xml:\"hobbies>string\"`",
            "\tAddress Address  `json:\"address\" yaml:\"address\" xml:\"address\"`",
            "\tBadge   uint16   `json:\"badge\" yaml:\"badge\" xml:\"badge\"`",
            "\tStreet string `json:\"street\" yaml:\"street\" xml:\"street\"`",
            "\tCity   string `json:\"city\" yaml:\"city\" xml:\"city\"`",
        ],
        Language::CSharp => vec![
            "    public string Name { get; set; } = \"\";",
            "    public int? Age { get; set; }",
            "    public List<string> Hobbies { get; set; } = new();",
            "    public Address Address { get; set; } = new();",
            "    public ushort Badge { get; set; }",
            "    public string Street { get; set; } = \"\";",
            "    public string City { get; set; } = \"\";",
        ],
        Language::Swift => vec![
            "    public var name: String",
            "    public var age: Int?",
            "    public var hobbies: [String]",
            "    public var address: Address",
            "    public var badge: UInt16",
            "    public var street: String",
            "    public var city: String",
        ],
    }
}

#[test]
fn every_emitter_declares_type_members_and_conversions() {
    let person = person();
    for language in Language::ALL {
        let code = generate_definition(&person, language);
        assert!(code.contains("Person"), "{}: missing type", language);
        assert!(code.contains("Address"), "{}: missing nested type", language);

        for declaration in declarations(language) {
            assert!(
                code.lines().any(|line| line.trim_end() == declaration),
                "{}: missing declaration {:?}",
                language,
                declaration
            );
        }

        let emitter = language.emitter(&Default::default());
        for format in emitter.formats() {
            let (to, from) = conversion_pair(language, *format);
            assert!(code.contains(to), "{}: missing {} serializer", language, format);
            assert!(code.contains(from), "{}: missing {} deserializer", language, format);
        }
    }
}

#[test]
fn u16_maps_to_a_type_that_holds_65535() {
    let expected = [
        (Language::Cpp,    "uint16_t"),
        (Language::Rust,   "u16"),
        (Language::Java,   "int"),
        (Language::Go,     "uint16"),
        (Language::CSharp, "ushort"),
        (Language::Swift,  "UInt16"),
    ];
    let u16_type = TypeDesc::fixed(IntKind::U16);
    for (language, type_name) in expected {
        let emitter = language.emitter(&Default::default());
        assert_eq!(emitter.type_str(&u16_type), type_name, "{}", language);
    }
}

#[test]
fn only_swift_omits_yaml_and_xml() {
    for language in Language::ALL {
        assert!(check_format(language, WireFormat::Json).is_ok());
        let full = language != Language::Swift;
        assert_eq!(check_format(language, WireFormat::Yaml).is_ok(), full, "{}", language);
        assert_eq!(check_format(language, WireFormat::Xml).is_ok(), full, "{}", language);
    }
    let err = check_format(Language::Swift, WireFormat::Xml).unwrap_err();
    assert_eq!(err.to_string(), "swift bindings do not support xml");
}

#[test]
fn shared_nested_record_is_declared_once() {
    let address = address();
    let person = Record::builder("Person")
        .field("home", TypeDesc::record(&address))
        .field("work", TypeDesc::record(&address))
        .build()
        .unwrap();

    let xsd = to_xsd(&person);
    assert_eq!(xsd.matches("<xs:complexType name=\"AddressType\">").count(), 1);

    let rust = generate_definition(&person, Language::Rust);
    assert_eq!(rust.matches("pub struct Address {").count(), 1);
    let go = generate_definition(&person, Language::Go);
    assert_eq!(go.matches("type Address struct").count(), 1);
    let cs = generate_definition(&person, Language::CSharp);
    assert_eq!(cs.matches("public class Address").count(), 1);
}

#[test]
fn language_names_parse() {
    assert_eq!("C++".parse::<Language>().unwrap(), Language::Cpp);
    assert_eq!("golang".parse::<Language>().unwrap(), Language::Go);
    assert!("cobol".parse::<Language>().is_err());
}
