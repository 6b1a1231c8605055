// shader_source.rs -- embedded GLSL for the built-in screen stage
//
// One body per shader, prefixed with a dialect header. GLSL 1.50 gets
// defines mapping the 1.10 keywords onto in/out.

use super::device_features::OglContextKind;

pub const POSITION_NAME: &str = "a_position";
pub const COLOR_NAME: &str = "a_color";
pub const TX_COORDS_NAME: &str = "a_tx_coords";

pub const MODEL_MAT_NAME: &str = "u_model_mat";
pub const VIEW_MAT_NAME: &str = "u_view_mat";
pub const PROJECTION_MAT_NAME: &str = "u_projection_mat";
pub const SAMPLER_NAME: &str = "u_sampler";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OglGlslDialect {
    /// Desktop GLSL 1.10.
    Glsl110,
    /// Desktop GLSL 1.50 (core profile).
    Glsl150,
    /// GLSL ES 1.00.
    Essl100,
}

impl OglGlslDialect {
    pub fn for_context(kind: OglContextKind) -> Self {
        if cfg!(feature = "gles") || kind == OglContextKind::Es {
            return OglGlslDialect::Essl100;
        }

        match kind {
            OglContextKind::Core => OglGlslDialect::Glsl150,
            _ => OglGlslDialect::Glsl110,
        }
    }

    fn vertex_header(self) -> &'static str {
        match self {
            OglGlslDialect::Glsl110 => "#version 110\n",
            OglGlslDialect::Glsl150 => "#version 150\n#define attribute in\n#define varying out\n",
            OglGlslDialect::Essl100 => "#version 100\nprecision mediump float;\n",
        }
    }

    fn fragment_header(self) -> &'static str {
        match self {
            OglGlslDialect::Glsl110 => "#version 110\n",
            OglGlslDialect::Glsl150 => {
                "#version 150\n#define varying in\n#define texture2D texture\n#define gl_FragColor o_color\nout vec4 o_color;\n"
            }
            OglGlslDialect::Essl100 => "#version 100\nprecision mediump float;\n",
        }
    }
}

const SCREEN_VERTEX_BODY: &str = r#"
attribute vec3 a_position;
attribute vec4 a_color;
attribute vec2 a_tx_coords;

uniform mat4 u_model_mat;
uniform mat4 u_view_mat;
uniform mat4 u_projection_mat;

varying vec4 g_color;
varying vec2 g_tx_coords;

void main()
{
    g_color = a_color;
    g_tx_coords = a_tx_coords;
    gl_Position = u_projection_mat * u_view_mat * u_model_mat * vec4(a_position, 1.0);
}
"#;

const SCREEN_FRAGMENT_BODY: &str = r#"
uniform sampler2D u_sampler;

varying vec4 g_color;
varying vec2 g_tx_coords;

void main()
{
    gl_FragColor = g_color * texture2D(u_sampler, g_tx_coords);
}
"#;

pub fn screen_vertex_source(dialect: OglGlslDialect) -> String {
    format!("{}{}", dialect.vertex_header(), SCREEN_VERTEX_BODY)
}

pub fn screen_fragment_source(dialect: OglGlslDialect) -> String {
    format!("{}{}", dialect.fragment_header(), SCREEN_FRAGMENT_BODY)
}
