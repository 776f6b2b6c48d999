//! Streaming semantics: fragment ordering, folding, and stream modes.

mod common;

use common::nodes::{Appender, Chunky};
use warpgraph::event_bus::{Event, StreamMode};
use warpgraph::graphs::GraphBuilder;
use warpgraph::state::VersionedState;
use warpgraph::types::NodeKind;

#[tokio::test]
async fn fragments_surface_in_production_order_and_fold_to_one_message() {
    let graph = GraphBuilder::new()
        .add_streaming_node(
            "writer",
            Chunky {
                id: "m-writer",
                parts: vec!["Clo", "udy", " today."],
            },
        )
        .add_edge("writer", NodeKind::End)
        .set_entry("writer")
        .compile()
        .unwrap();

    let (handle, mut events) = graph.stream(
        VersionedState::new_with_user_message("weather?"),
        StreamMode::Events,
    );
    let all = common::drain(&mut events).await;

    let fragments: Vec<_> = all
        .iter()
        .filter_map(|event| match event {
            Event::Stream(f) => Some(f),
            _ => None,
        })
        .collect();
    assert_eq!(fragments.len(), 3);
    for (i, fragment) in fragments.iter().enumerate() {
        assert_eq!(fragment.seq, i as u64);
        assert_eq!(fragment.node, NodeKind::Custom("writer".into()));
    }
    let last_content = fragments[2].fragment.messages.as_ref().unwrap()[0]
        .content
        .clone();
    assert_eq!(last_content, "Cloudy today.");

    // The committed transcript holds exactly one assistant message whose
    // content equals the fold of all fragments.
    let state = handle.join().await.unwrap();
    let messages = state.messages.snapshot();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].id, "m-writer");
    assert_eq!(messages[1].content, "Cloudy today.");
}

#[tokio::test]
async fn interleaved_nodes_keep_per_node_fragment_order() {
    let graph = GraphBuilder::new()
        .add_node("fork", Appender("forked"))
        .add_streaming_node(
            "left",
            Chunky {
                id: "m-left",
                parts: vec!["L1", "L2", "L3"],
            },
        )
        .add_streaming_node(
            "right",
            Chunky {
                id: "m-right",
                parts: vec!["R1", "R2"],
            },
        )
        .add_edge("fork", "left")
        .add_edge("fork", "right")
        .set_entry("fork")
        .compile()
        .unwrap();

    let (handle, mut events) = graph.stream(
        VersionedState::new_with_user_message("go"),
        StreamMode::Events,
    );
    let all = common::drain(&mut events).await;
    handle.join().await.unwrap();

    for node in ["left", "right"] {
        let kind = NodeKind::Custom(node.into());
        let seqs: Vec<u64> = all
            .iter()
            .filter_map(|event| match event {
                Event::Stream(f) if f.node == kind => Some(f.seq),
                _ => None,
            })
            .collect();
        let expected: Vec<u64> = (0..seqs.len() as u64).collect();
        assert_eq!(seqs, expected, "fragments of {node} out of order");
    }
}

#[tokio::test]
async fn values_mode_yields_only_the_final_state() {
    let graph = GraphBuilder::new()
        .add_node("a", Appender("one"))
        .add_node("b", Appender("two"))
        .add_edge("a", "b")
        .add_edge("b", NodeKind::End)
        .set_entry("a")
        .compile()
        .unwrap();

    let (handle, mut events) = graph.stream(
        VersionedState::new_with_user_message("go"),
        StreamMode::Values,
    );
    let all = common::drain(&mut events).await;
    handle.join().await.unwrap();

    let counts: Vec<usize> = all
        .iter()
        .filter_map(|event| match event {
            Event::Values(v) => Some(v.snapshot.messages.len()),
            _ => None,
        })
        .collect();
    assert_eq!(counts, vec![3]);
    assert!(all.last().unwrap().is_run_end());
}

#[tokio::test]
async fn event_subscription_adapts_to_a_stream() {
    use tokio_stream::StreamExt as _;

    let graph = GraphBuilder::new()
        .add_node("a", Appender("one"))
        .add_edge("a", NodeKind::End)
        .set_entry("a")
        .compile()
        .unwrap();

    let (handle, events) = graph.stream(
        VersionedState::new_with_user_message("go"),
        StreamMode::Events,
    );
    let mut stream = std::pin::pin!(events.into_stream());
    let mut saw_run_end = false;
    while let Some(event) = stream.next().await {
        if event.is_run_end() {
            saw_run_end = true;
            break;
        }
    }
    assert!(saw_run_end);
    handle.join().await.unwrap();
}

#[tokio::test]
async fn updates_mode_shows_only_committed_partials() {
    let graph = GraphBuilder::new()
        .add_node("a", Appender("one"))
        .add_edge("a", NodeKind::End)
        .set_entry("a")
        .compile()
        .unwrap();

    let (handle, mut events) = graph.stream(
        VersionedState::new_with_user_message("go"),
        StreamMode::Updates,
    );
    let all = common::drain(&mut events).await;
    handle.join().await.unwrap();

    assert_eq!(all.len(), 2);
    match &all[0] {
        Event::Update(update) => {
            assert_eq!(update.node, NodeKind::Custom("a".into()));
            let messages = update.update.messages.as_ref().unwrap();
            assert_eq!(messages[0].content, "one");
        }
        other => panic!("expected an update event, got {other}"),
    }
    assert!(all[1].is_run_end());
}
