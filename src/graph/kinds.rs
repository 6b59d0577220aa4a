use crate::foundation::core::{PIXEL_WHITE, PIXEL_ZERO, Pixel};
use crate::foundation::error::{CompositorError, CompositorResult};

/// Execution class of a node type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeClass {
    /// Pure per-pixel expression; merged into shader groups, never executed alone.
    Fusable,
    /// Needs buffer allocation, neighborhood access, or multiple passes.
    Standalone,
    /// Real algorithm unavailable in this execution path; compiles to a
    /// pass-through of the primary image input plus a diagnostic.
    Unsupported,
}

/// Declaration of one input socket.
#[derive(Clone, Copy, Debug)]
pub struct InputDecl {
    /// Socket name, unique within the node type.
    pub name: &'static str,
    /// Value substituted when the socket is unconnected.
    pub default: Pixel,
    /// Domain priority ordinal; 0 is the most authoritative (the main image).
    pub domain_priority: u16,
    /// Whether the socket is read as a scalar via the single-value fast path.
    pub expects_single_value: bool,
}

/// Static description of a node type: sockets and execution class.
#[derive(Clone, Copy, Debug)]
pub struct NodeDescriptor {
    /// Canonical type name (the serialized identifier).
    pub name: &'static str,
    /// Input sockets in order.
    pub inputs: &'static [InputDecl],
    /// Number of output sockets.
    pub output_count: u16,
    /// Execution class.
    pub class: NodeClass,
}

const fn image_input(name: &'static str, priority: u16) -> InputDecl {
    InputDecl {
        name,
        default: PIXEL_WHITE,
        domain_priority: priority,
        expects_single_value: false,
    }
}

const fn scalar_input(name: &'static str, priority: u16, default: f32) -> InputDecl {
    InputDecl {
        name,
        default: [default, default, default, default],
        domain_priority: priority,
        expects_single_value: true,
    }
}

/// The closed set of node types known to the engine.
///
/// Node-specific parameters (math operation, blur radius, input name) ride on
/// [`crate::Node::params`] and are parsed where they are consumed; the enum
/// itself stays fieldless so the compiler's dispatch is exhaustive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Constant scalar (`params.value`).
    Value,
    /// Constant color (`params.color`).
    RgbColor,
    /// Componentwise arithmetic between two inputs (`params.op`).
    Math,
    /// Linear blend of two inputs by a factor input.
    Mix,
    /// Color inversion, alpha preserved.
    Invert,
    /// Replace alpha with a second input's scalar.
    SetAlpha,
    /// Split a color into four scalar channel outputs.
    SeparateColor,
    /// Assemble a color from four scalar channel inputs.
    CombineColor,
    /// Translate the image domain in shared space.
    Translate,
    /// Rotate the image domain in shared space.
    Rotate,
    /// Scale the image domain in shared space.
    Scale,
    /// Separable box blur (`params.radius`), a two-pass compute operation.
    BoxBlur,
    /// Per-pixel coordinate grid over the render size.
    Coordinates,
    /// Bind an externally supplied image by name (`params.name`).
    ImageInput,
    /// Route one of two inputs through unchanged, chosen by a selector input.
    Switch,
    /// Graph sink; exports its input as an execution result.
    Output,
    /// Iterative denoise; not implementable here, degrades to pass-through.
    Denoise,
}

static VALUE_DESC: NodeDescriptor = NodeDescriptor {
    name: "value",
    inputs: &[],
    output_count: 1,
    class: NodeClass::Fusable,
};

static RGB_COLOR_DESC: NodeDescriptor = NodeDescriptor {
    name: "rgb_color",
    inputs: &[],
    output_count: 1,
    class: NodeClass::Fusable,
};

static MATH_DESC: NodeDescriptor = NodeDescriptor {
    name: "math",
    inputs: &[scalar_input("a", 0, 0.5), scalar_input("b", 1, 0.5)],
    output_count: 1,
    class: NodeClass::Fusable,
};

static MIX_DESC: NodeDescriptor = NodeDescriptor {
    name: "mix",
    inputs: &[
        scalar_input("factor", 2, 0.5),
        image_input("a", 0),
        image_input("b", 1),
    ],
    output_count: 1,
    class: NodeClass::Fusable,
};

static INVERT_DESC: NodeDescriptor = NodeDescriptor {
    name: "invert",
    inputs: &[image_input("image", 0)],
    output_count: 1,
    class: NodeClass::Fusable,
};

static SET_ALPHA_DESC: NodeDescriptor = NodeDescriptor {
    name: "set_alpha",
    inputs: &[image_input("image", 0), scalar_input("alpha", 1, 1.0)],
    output_count: 1,
    class: NodeClass::Fusable,
};

static SEPARATE_COLOR_DESC: NodeDescriptor = NodeDescriptor {
    name: "separate_color",
    inputs: &[image_input("image", 0)],
    output_count: 4,
    class: NodeClass::Fusable,
};

static COMBINE_COLOR_DESC: NodeDescriptor = NodeDescriptor {
    name: "combine_color",
    inputs: &[
        scalar_input("r", 0, 0.0),
        scalar_input("g", 1, 0.0),
        scalar_input("b", 2, 0.0),
        scalar_input("a", 3, 1.0),
    ],
    output_count: 1,
    class: NodeClass::Fusable,
};

static TRANSLATE_DESC: NodeDescriptor = NodeDescriptor {
    name: "translate",
    inputs: &[
        image_input("image", 0),
        scalar_input("x", 1, 0.0),
        scalar_input("y", 2, 0.0),
    ],
    output_count: 1,
    class: NodeClass::Standalone,
};

static ROTATE_DESC: NodeDescriptor = NodeDescriptor {
    name: "rotate",
    inputs: &[image_input("image", 0), scalar_input("angle", 1, 0.0)],
    output_count: 1,
    class: NodeClass::Standalone,
};

static SCALE_DESC: NodeDescriptor = NodeDescriptor {
    name: "scale",
    inputs: &[
        image_input("image", 0),
        scalar_input("x", 1, 1.0),
        scalar_input("y", 2, 1.0),
    ],
    output_count: 1,
    class: NodeClass::Standalone,
};

static BOX_BLUR_DESC: NodeDescriptor = NodeDescriptor {
    name: "box_blur",
    inputs: &[image_input("image", 0)],
    output_count: 1,
    class: NodeClass::Standalone,
};

static COORDINATES_DESC: NodeDescriptor = NodeDescriptor {
    name: "coordinates",
    inputs: &[],
    output_count: 1,
    class: NodeClass::Standalone,
};

static IMAGE_INPUT_DESC: NodeDescriptor = NodeDescriptor {
    name: "image_input",
    inputs: &[],
    output_count: 1,
    class: NodeClass::Standalone,
};

static SWITCH_DESC: NodeDescriptor = NodeDescriptor {
    name: "switch",
    inputs: &[
        scalar_input("switch", 2, 0.0),
        image_input("a", 0),
        image_input("b", 1),
    ],
    output_count: 1,
    class: NodeClass::Standalone,
};

static OUTPUT_DESC: NodeDescriptor = NodeDescriptor {
    name: "output",
    inputs: &[InputDecl {
        name: "image",
        default: PIXEL_ZERO,
        domain_priority: 0,
        expects_single_value: false,
    }],
    output_count: 0,
    class: NodeClass::Standalone,
};

static DENOISE_DESC: NodeDescriptor = NodeDescriptor {
    name: "denoise",
    inputs: &[image_input("image", 0)],
    output_count: 1,
    class: NodeClass::Unsupported,
};

impl NodeKind {
    /// Static socket/class description for this kind.
    pub fn descriptor(&self) -> &'static NodeDescriptor {
        match self {
            NodeKind::Value => &VALUE_DESC,
            NodeKind::RgbColor => &RGB_COLOR_DESC,
            NodeKind::Math => &MATH_DESC,
            NodeKind::Mix => &MIX_DESC,
            NodeKind::Invert => &INVERT_DESC,
            NodeKind::SetAlpha => &SET_ALPHA_DESC,
            NodeKind::SeparateColor => &SEPARATE_COLOR_DESC,
            NodeKind::CombineColor => &COMBINE_COLOR_DESC,
            NodeKind::Translate => &TRANSLATE_DESC,
            NodeKind::Rotate => &ROTATE_DESC,
            NodeKind::Scale => &SCALE_DESC,
            NodeKind::BoxBlur => &BOX_BLUR_DESC,
            NodeKind::Coordinates => &COORDINATES_DESC,
            NodeKind::ImageInput => &IMAGE_INPUT_DESC,
            NodeKind::Switch => &SWITCH_DESC,
            NodeKind::Output => &OUTPUT_DESC,
            NodeKind::Denoise => &DENOISE_DESC,
        }
    }

    /// Canonical type name.
    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Execution class shortcut.
    pub fn class(&self) -> NodeClass {
        self.descriptor().class
    }

    /// Resolve a type identifier string, the ingestion point for external
    /// graph descriptions.
    pub fn parse(name: &str) -> CompositorResult<NodeKind> {
        let trimmed = name.trim().to_ascii_lowercase();
        ALL_KINDS
            .iter()
            .copied()
            .find(|k| k.name() == trimmed)
            .ok_or_else(|| CompositorError::unknown_node_type(name))
    }
}

static ALL_KINDS: &[NodeKind] = &[
    NodeKind::Value,
    NodeKind::RgbColor,
    NodeKind::Math,
    NodeKind::Mix,
    NodeKind::Invert,
    NodeKind::SetAlpha,
    NodeKind::SeparateColor,
    NodeKind::CombineColor,
    NodeKind::Translate,
    NodeKind::Rotate,
    NodeKind::Scale,
    NodeKind::BoxBlur,
    NodeKind::Coordinates,
    NodeKind::ImageInput,
    NodeKind::Switch,
    NodeKind::Output,
    NodeKind::Denoise,
];

/// Componentwise math operation parsed from a math node's `op` parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Minimum,
    Maximum,
    Power,
}

impl MathOp {
    pub(crate) fn parse(op: &str) -> CompositorResult<MathOp> {
        match op.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(MathOp::Add),
            "subtract" => Ok(MathOp::Subtract),
            "multiply" => Ok(MathOp::Multiply),
            "divide" => Ok(MathOp::Divide),
            "minimum" => Ok(MathOp::Minimum),
            "maximum" => Ok(MathOp::Maximum),
            "power" => Ok(MathOp::Power),
            other => Err(CompositorError::shader_compile(format!(
                "unknown math op '{other}'"
            ))),
        }
    }

    pub(crate) fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            MathOp::Add => a + b,
            MathOp::Subtract => a - b,
            MathOp::Multiply => a * b,
            MathOp::Divide => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
            MathOp::Minimum => a.min(b),
            MathOp::Maximum => a.max(b),
            MathOp::Power => a.powf(b),
        }
    }
}
