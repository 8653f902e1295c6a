// example/src/main.rs

use serde_json::json;
use sdgen::*;

fn main() -> Result<(), SchemaError> {
    // Address is shared by two Person fields; every emitter declares it once.
    let address = Record::builder("Address")
        .field("street", TypeDesc::string())
        .field("city",   TypeDesc::string())
        .field("zip",    TypeDesc::optional(TypeDesc::fixed(IntKind::U32)))
        .build()?;

    let person = Record::builder("Person")
        .field("name",    TypeDesc::string())
        .field("age",     TypeDesc::optional(TypeDesc::fixed(IntKind::U8)))
        .field("hobbies", TypeDesc::list(TypeDesc::string()))
        .field("home",    TypeDesc::record(&address))
        .field("work",    TypeDesc::optional(TypeDesc::record(&address)))
        .field_with_default("badge", TypeDesc::fixed(IntKind::U16), json!(0))
        .build()?;

    for language in Language::ALL {
        let source = generate(&person, language);
        println!(
            "{:<7} {:>6} bytes, {:>4} lines",
            language.name(),
            source.len(),
            source.lines().count()
        );
    }
    println!("xsd     {:>6} bytes\n", to_xsd(&person).len());

    // Native trees are coerced and range checked on the way in.
    let alice = Instance::from_native_tree(
        &person,
        &json!({
            "name": "Alice",
            "age": "34",
            "hobbies": ["chess", "go"],
            "home": { "street": "1 Main St", "city": "Springfield" },
            "badge": 65535
        }),
    )?;

    let json = alice.to_json()?;
    let yaml = Instance::from_json(&person, &json)?.to_yaml()?;
    let xml = Instance::from_yaml(&person, &yaml)?.to_xml()?;
    let back = Instance::from_xml(&person, &xml)?;

    println!("{}\n", json);
    println!("{}", xml);
    println!("round trip preserved the instance: {}", back == alice);

    let too_big = Instance::from_native_tree(
        &person,
        &json!({
            "name": "Bob",
            "hobbies": [],
            "home": { "street": "2 Side St", "city": "Shelbyville" },
            "badge": 65536
        }),
    );
    match too_big {
        Err(err) => println!("rejected: {}", err),
        Ok(_) => println!("unexpectedly accepted an out-of-range badge"),
    }

    Ok(())
}
