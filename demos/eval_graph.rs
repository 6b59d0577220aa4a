use compositor::{
    Context, Domain, ExternalInputs, Link, Node, NodeGraph, NodeId, NodeKind, PixelBuffer,
    RealizeOptions, Size2, Value, compile, execute,
};

fn checkerboard(size: Size2) -> anyhow::Result<Value> {
    let data = (0..size.num_pixels())
        .map(|i| {
            let x = i as i32 % size.width;
            let y = i as i32 / size.width;
            if ((x / 16) + (y / 16)) % 2 == 0 {
                [0.9, 0.9, 0.9, 1.0]
            } else {
                [0.1, 0.1, 0.1, 1.0]
            }
        })
        .collect();
    Ok(Value::from_buffer(
        PixelBuffer::new(size, data)?,
        Domain::identity(size),
        RealizeOptions::default(),
    )?)
}

fn link(from: u32, from_output: u16, to: u32, to_input: u16) -> Link {
    Link {
        from_node: NodeId(from),
        from_output,
        to_node: NodeId(to),
        to_input,
    }
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let size = Size2::new(320, 180)?;

    // frame -> (blurred copy) -> mix -> invert -> output
    let graph = NodeGraph::new(
        vec![
            Node::with_params(
                NodeId(1),
                NodeKind::ImageInput,
                serde_json::json!({ "name": "frame" }),
            ),
            Node::with_params(NodeId(2), NodeKind::BoxBlur, serde_json::json!({ "radius": 4 })),
            Node::new(NodeId(3), NodeKind::Mix),
            Node::new(NodeId(4), NodeKind::Invert),
            Node::new(NodeId(5), NodeKind::Output),
        ],
        vec![
            link(1, 0, 2, 0),
            link(1, 0, 3, 1),
            link(2, 0, 3, 2),
            link(3, 0, 4, 0),
            link(4, 0, 5, 0),
        ],
    )?;

    let plan = compile(&graph)?;
    println!("plan: {} operations", plan.operations.len());

    let mut ctx = Context::new(size);
    let mut externals = ExternalInputs::new();
    externals.insert("frame", checkerboard(size)?);

    let results = execute(&plan, &graph, &mut ctx, &externals)?;
    let out = &results[&NodeId(5)];
    println!(
        "output: {}x{}, valid: {}",
        out.domain().size.width,
        out.domain().size.height,
        out.is_valid()
    );
    println!("stats: {:?}", ctx.stats());
    for d in ctx.diagnostics() {
        println!("diagnostic: {d}");
    }

    Ok(())
}
