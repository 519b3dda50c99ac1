use balanced_trees::{AvlTreeMap, RbTreeMap};

fn main() {
    let mut avl = AvlTreeMap::new();
    let mut rb = RbTreeMap::new();
    for (key, value) in [(1, "1"), (2, "2"), (3, "3"), (4, "4"), (5, "5"), (6, "6")] {
        avl.insert(key, value);
        rb.insert(key, value);
    }

    println!("AVL level-order traversal:");
    for node in &avl {
        println!("Key: {}, Value: {}, Height: {}", node.key(), node.value(), node.height());
    }

    println!("Red-black level-order traversal:");
    for node in &rb {
        println!("Key: {}, Value: {}, Color: {:?}", node.key(), node.value(), node.color());
    }
}
