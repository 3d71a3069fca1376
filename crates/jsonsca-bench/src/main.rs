//! Benchmark for JSON/SCA encoding using a synthetic social graph.
//!
//! Every person belongs to a shared country, has a small avatar blob, a
//! `self` back-link and a friends list pointing at people listed before
//! them, so the graph is dense with shared references and cycles while
//! nesting stays shallow.
//!
//! Usage: bench-graph [PEOPLE]

use std::env;
use std::time::Instant;

use futures::executor::block_on;
use jsonsca::{
    decode, encode, node_from_json, node_to_json, validate_node, Blob, Date, Handle, Heap,
    InlineSource, Node, ValidationContext, Value,
};

const DEFAULT_PEOPLE: usize = 20_000;
const FRIENDS_PER_PERSON: usize = 8;
const COUNTRIES: usize = 50;
const ITERS: u32 = 5;

/// Deterministic xorshift, so every run builds the same graph.
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

fn build_graph(people: usize) -> (Heap, Value) {
    let mut heap = Heap::with_capacity(people * 3 + COUNTRIES);
    let mut rng = Rng(0x9E37_79B9_7F4A_7C15);

    let countries: Vec<Value> = (0..COUNTRIES)
        .map(|i| {
            heap.build_object(|o| {
                o.set("name", format!("Country {}", i))
                    .set("code", format!("C{:02}", i))
            })
        })
        .collect();

    // Allocate first so each person can point at themselves.
    let handles: Vec<Handle> = (0..people).map(|_| heap.alloc_object()).collect();

    for (i, &handle) in handles.iter().enumerate() {
        let avatar: Vec<u8> = (0..64).map(|_| rng.next_u64() as u8).collect();
        let avatar = heap.blob(Blob::new("image/png", avatar));
        let friends: Vec<Value> = (0..FRIENDS_PER_PERSON)
            .map(|_| Value::Entity(handles[rng.below(i + 1)]))
            .collect();
        let friends = heap.array(friends);
        let country = countries[rng.below(COUNTRIES)].clone();
        let born = Date::from_epoch_millis(rng.below(2_000_000_000) as i64 * 1000);

        let person = heap.get_object_mut(handle).expect("allocated above");
        person.insert("name", Value::from(format!("Person {}", i)));
        person.insert("born", Value::from(born));
        person.insert("country", country);
        person.insert("avatar", avatar);
        person.insert("friends", friends);
        person.insert("self", Value::Entity(handle));
    }

    let root = heap.array(handles.into_iter().map(Value::Entity).collect());
    (heap, root)
}

fn count_nodes(node: &Node) -> (usize, usize) {
    let here = match node {
        Node::Reference(_) => (0, 1),
        _ if node.id().is_some() => (1, 0),
        _ => (0, 0),
    };
    node.children().map(count_nodes).fold(here, |(d, r), (cd, cr)| (d + cd, r + cr))
}

fn main() {
    let people = env::args()
        .nth(1)
        .map(|arg| arg.parse::<usize>().expect("PEOPLE must be a number"))
        .unwrap_or(DEFAULT_PEOPLE);

    println!("=== JSON/SCA Graph Benchmark ===");
    println!("People: {}", people);
    println!("Friends per person: {}", FRIENDS_PER_PERSON);

    let build_start = Instant::now();
    let (heap, root) = build_graph(people);
    println!("\nBuilt graph: {} entities in {:?}", heap.len(), build_start.elapsed());

    // Warmup
    for _ in 0..2 {
        let _ = block_on(encode(&heap, &root, &InlineSource)).expect("Failed to encode");
    }

    let encode_start = Instant::now();
    let mut node = None;
    for _ in 0..ITERS {
        node = Some(block_on(encode(&heap, &root, &InlineSource)).expect("Failed to encode"));
    }
    let encode_time = encode_start.elapsed() / ITERS;
    let node = node.expect("at least one iteration");

    let (definitions, references) = count_nodes(&node);
    println!("\nEncode: {:?} (avg of {} iterations)", encode_time, ITERS);
    println!("  Definitions: {}", definitions);
    println!("  References:  {}", references);

    let mut context = ValidationContext::new();
    validate_node(&node, &mut context).expect("encoded tree should validate");

    let stringify_start = Instant::now();
    let text = serde_json::to_string(&node_to_json(&node)).expect("Failed to serialize");
    let stringify_time = stringify_start.elapsed();
    println!(
        "\nStringify: {} bytes ({:.1} MB) in {:?}",
        text.len(),
        text.len() as f64 / 1_000_000.0,
        stringify_time
    );
    println!(
        "  Throughput: {:.2} MB/s",
        (text.len() as f64 / 1_000_000.0) / stringify_time.as_secs_f64()
    );

    let parse_start = Instant::now();
    let json: serde_json::Value = serde_json::from_str(&text).expect("Failed to parse");
    let parsed = node_from_json(&json).expect("Failed to read wire nodes");
    let parse_time = parse_start.elapsed();
    println!("\nParse: {:?}", parse_time);
    println!(
        "  Throughput: {:.2} MB/s",
        (text.len() as f64 / 1_000_000.0) / parse_time.as_secs_f64()
    );
    assert_eq!(parsed, node);

    let decode_start = Instant::now();
    let mut graph = None;
    for _ in 0..ITERS {
        graph = Some(decode(&parsed).expect("Failed to decode"));
    }
    let decode_time = decode_start.elapsed() / ITERS;
    let graph = graph.expect("at least one iteration");
    println!("\nDecode: {:?} (avg of {} iterations)", decode_time, ITERS);
    assert_eq!(graph.heap.len(), definitions, "every entity is defined exactly once");

    // Re-encoding the decoded graph yields the same tree.
    let again = block_on(encode(&graph.heap, &graph.root, &InlineSource))
        .expect("Failed to re-encode");
    assert_eq!(again, node);

    println!("\n=== Summary ===");
    println!("Entities: {}", definitions);
    println!("JSON size: {} bytes", text.len());
    println!(
        "Bytes per entity: {:.1}",
        text.len() as f64 / definitions as f64
    );
    println!(
        "Round trip: {:?}",
        encode_time + stringify_time + parse_time + decode_time
    );
}
