use std::collections::HashMap;
use std::fmt;

use bpm_plist::{NodeKey, Plist, PlistError, PlistQueue, PlistStorage};
use bpm_test_framework::helpers;
use cucumber::{given, then, when, World};

const CAPACITY: usize = 64;

#[derive(World)]
#[world(init = Self::new)]
pub struct PlistWorld {
    storage: PlistStorage<String>,
    list: Plist,
    keys: HashMap<String, NodeKey>,
    last: Option<Result<(), PlistError>>,
    /// Stamp of each node's latest (re)insertion
    arrivals: HashMap<NodeKey, u64>,
    clock: u64,
    queue: PlistQueue<String>,
}

impl fmt::Debug for PlistWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlistWorld")
            .field("order", &self.order())
            .field("last", &self.last)
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl PlistWorld {
    fn new() -> Self {
        helpers::init_tracing();
        Self {
            storage: PlistStorage::with_capacity(CAPACITY),
            list: Plist::new(),
            keys: HashMap::new(),
            last: None,
            arrivals: HashMap::new(),
            clock: 0,
            queue: PlistQueue::with_capacity(CAPACITY),
        }
    }

    fn key(&self, name: &str) -> NodeKey {
        *self.keys.get(name).unwrap_or_else(|| panic!("unknown node {name}"))
    }

    /// Node for `name`, created unlinked with `prio` on first use
    fn node(&mut self, name: &str, prio: i32) -> NodeKey {
        if let Some(&key) = self.keys.get(name) {
            return key;
        }
        let key = self
            .storage
            .try_insert(prio, name.to_string())
            .unwrap_or_else(|_| panic!("storage full"));
        self.keys.insert(name.to_string(), key);
        key
    }

    fn add(&mut self, name: &str, prio: i32) {
        let key = self.node(name, prio);
        let result = self.list.add(&mut self.storage, key);
        self.record(key, result);
    }

    /// Store an operation's result; a success counts as a new arrival
    fn record(&mut self, key: NodeKey, result: Result<(), PlistError>) {
        if result.is_ok() {
            self.clock += 1;
            self.arrivals.insert(key, self.clock);
        }
        self.last = Some(result);
    }

    fn order(&self) -> String {
        helpers::entries(&self.list, &self.storage)
            .into_iter()
            .map(|(_, name)| name)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn name_of(&self, key: Option<NodeKey>) -> Option<&str> {
        key.and_then(|k| self.storage.get(k)).map(String::as_str)
    }
}

#[given("an empty plist")]
fn empty_plist(world: &mut PlistWorld) {
    assert!(world.list.is_empty());
}

#[given("an empty queue")]
fn empty_queue(world: &mut PlistWorld) {
    assert!(world.queue.is_empty());
}

#[when(expr = "I add nodes {string}")]
fn add_nodes(world: &mut PlistWorld, nodes: String) {
    for entry in nodes.split_whitespace() {
        let (name, prio) = entry.split_once(':').expect("nodes are written name:prio");
        let prio: i32 = prio.parse().expect("priority is an integer");
        world.add(name, prio);
        assert_eq!(world.last, Some(Ok(())));
    }
}

#[when(expr = "I add {word} with priority {int}")]
fn add_node(world: &mut PlistWorld, name: String, prio: i32) {
    world.add(&name, prio);
}

#[when(expr = "I create {word} with priority {int}")]
fn create_node(world: &mut PlistWorld, name: String, prio: i32) {
    world.node(&name, prio);
}

#[when(expr = "I delete {word}")]
fn delete_node(world: &mut PlistWorld, name: String) {
    let key = world.key(&name);
    world.last = Some(world.list.del(&mut world.storage, key));
}

#[when(expr = "I requeue {word}")]
fn requeue_node(world: &mut PlistWorld, name: String) {
    let key = world.key(&name);
    let result = world.list.requeue(&mut world.storage, key);
    world.record(key, result);
}

#[when(expr = "I change the priority of {word} to {int}")]
fn change_prio(world: &mut PlistWorld, name: String, prio: i32) {
    let key = world.key(&name);
    let result = world.list.set_prio(&mut world.storage, key, prio);
    world.record(key, result);
}

#[when(expr = "I push {string} with priority {int}")]
fn push(world: &mut PlistWorld, name: String, prio: i32) {
    world.queue.push(prio, name).expect("queue has room");
}

#[then(expr = "the order is {string}")]
fn order_is(world: &mut PlistWorld, expected: String) {
    assert_eq!(world.order(), expected);

    let seq: Vec<(i32, u64)> = world
        .list
        .iter(&world.storage)
        .map(|(key, prio, _)| (prio, world.arrivals[&key]))
        .collect();
    assert!(helpers::is_stable_order(&seq), "not in priority then arrival order: {seq:?}");
}

#[then(expr = "the distinct priorities are {string}")]
fn distinct_prios_are(world: &mut PlistWorld, expected: String) {
    let got: Vec<String> = helpers::distinct_prios(&world.list, &world.storage)
        .iter()
        .map(i32::to_string)
        .collect();
    assert_eq!(got.join(" "), expected);
}

#[then(expr = "the first node is {word}")]
fn first_is(world: &mut PlistWorld, name: String) {
    assert_eq!(world.name_of(world.list.first()), Some(name.as_str()));
}

#[then(expr = "the last node is {word}")]
fn last_is(world: &mut PlistWorld, name: String) {
    assert_eq!(world.name_of(world.list.last()), Some(name.as_str()));
}

#[then("the list is empty")]
fn list_empty(world: &mut PlistWorld) {
    assert!(world.list.is_empty());
    assert_eq!(world.list.first(), None);
    assert_eq!(world.list.last(), None);
}

#[then("the list is consistent")]
fn list_consistent(world: &mut PlistWorld) {
    assert_eq!(world.list.check(&world.storage), Ok(()));
    assert_eq!(world.list.len(), world.list.iter(&world.storage).count());
}

#[then(expr = "{word} is not linked")]
fn not_linked(world: &mut PlistWorld, name: String) {
    let key = world.key(&name);
    assert!(!world.storage.is_linked(key));
    assert!(!world.list.contains(&world.storage, key));
}

#[then("the last operation succeeded")]
fn last_ok(world: &mut PlistWorld) {
    assert_eq!(world.last, Some(Ok(())));
}

#[then(expr = "the last operation failed with {string}")]
fn last_failed(world: &mut PlistWorld, message: String) {
    match &world.last {
        Some(Err(err)) => assert_eq!(err.to_string(), message),
        other => panic!("expected an error, got {other:?}"),
    }
}

#[then(expr = "popping everything yields {string}")]
fn pop_all(world: &mut PlistWorld, expected: String) {
    let mut popped = Vec::new();
    while let Some((_, name)) = world.queue.pop() {
        popped.push(name);
    }
    assert_eq!(popped.join(" "), expected);
    assert_eq!(world.queue.check(), Ok(()));
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    PlistWorld::run(concat!(env!("CARGO_MANIFEST_DIR"), "/features")).await;
}
