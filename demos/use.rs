use balanced_trees::{AvlTreeMap, OrderedMap, RbTreeMap};

fn fill<M: OrderedMap<i32, &'static str>>(map: &mut M) {
    map.insert(0, "zero");
    map.insert(1, "one");
    map.insert(2, "two");
    map.insert(2, "two");
    map.insert(3, "three");
    map.insert(4, "four");
    map.insert(5, "five");
    assert_eq!(map.find(&1), Some(&"one"));
    map.remove(&1);
    assert!(map.find(&1).is_none());
}

fn main() {
    let mut avl = AvlTreeMap::new();
    fill(&mut avl);
    avl.for_each_in_order(|k, v| println!("{k} => {v}"));

    let mut rb = RbTreeMap::new();
    fill(&mut rb);
    println!("{rb:?}");
    println!("black height: {}", rb.black_height());
}
