use std::sync::Arc;

use stateflow::{EditorBuilder, EditorEvent, MemStore, Position};

#[tokio::main]
async fn main() {
    let editor = EditorBuilder::new().store(Arc::new(MemStore::new())).build().unwrap();
    let mut events = editor.subscribe();

    editor.load().await.unwrap();

    editor.add_state("A", Some(Position::new(10.0, 10.0))).await.unwrap();
    editor.add_state("B", Some(Position::new(200.0, 10.0))).await.unwrap();
    let a = editor.connect("A", "B", "success").await.unwrap();
    println!("A transitions: {:?}", a.transitions);

    editor.add_state("C", None).await.unwrap();
    editor.add_state("D", None).await.unwrap();
    editor.connect("A", "C", "failure").await.unwrap();
    editor.connect("A", "D", "failure").await.unwrap();
    println!("{}", editor.graph().schema());

    let cascade = editor.delete_state("B").await.unwrap();
    println!("deleted B, rewrote {:?}", cascade);
    println!("A transitions: {:?}", editor.definition("A").unwrap().transitions);

    editor.open_panel("A").unwrap();
    editor.toggle_primitive("validateOrder").unwrap();
    editor.toggle_primitive("shipOrder").unwrap();
    let a = editor.confirm_panel().await.unwrap();
    println!("A primitives: {:?}", a.primitives());

    let saved = editor.save_flow().await.unwrap();
    println!("saved {} states", saved);
    println!("{}", editor.graph().schema());

    while let Ok(event) = events.try_recv() {
        if let EditorEvent::StateDeleted {
            name,
            cascade,
        } = event.inner()
        {
            println!("event: {} deleted, cascade {:?}", name, cascade);
        } else {
            println!("event: {:?}", event.inner());
        }
    }
}
