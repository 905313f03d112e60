//! Prompt text and topic catalogue sent to the generative model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shared system instruction for every stage that produces TikZ or SVG.
pub const SYSTEM_INSTRUCTION: &str = r#"You are an expert typesetter of mathematics and engineering documents and a master of TikZ and SVG.
Task: convert TikZ to SVG or the other way around with exact fidelity.

%% GEOMETRY RULES %%
1. Plane geometry: use SOLID lines only for every line (altitudes, medians, bisectors, circles...).
   Never use dashed, dotted or dash-dot strokes.
2. Space geometry: use dashed strokes only for hidden edges.
3. Legend: do not draw a legend or key unless asked. Put labels directly on the figure.

%% TIKZ TO SVG %%
When converting TikZ to SVG:
- Reproduce TikZ coordinate calculations exactly (e.g. $(A)!(P)!(B)$ is a projection, $(A)!0.5!(B)$ is a midpoint).
- Draw arrows, right-angle marks and labels at their correct positions.
- Always return a complete, standalone <svg> with a viewBox and suitable width/height.
- Use a legible font for point labels.
"#;

/// System instruction for reading an exercise out of a photograph.
pub const IMAGE_ANALYST_INSTRUCTION: &str = "You are an expert at analysing mathematics exercises.";

/// Reference snippets of idiomatic TikZ for the topics in [`MathTopic`].
pub const SNIPPETS_CONTEXT: &str = r#"
%% =============== VARIATION & SIGN TABLES (tkz-tab) ===============
% Variation table of a cubic:
% \tkzTabInit[lgt=2,espcl=2.5]{$x$/1, $y'$/1, $y$/2}{$-\infty$, $1$, $3$, $+\infty$}
% \tkzTabLine{,+,0,-,0,+,}
% \tkzTabVar{-/$-\infty$, +/$4$, -/$0$, +/$+\infty$}

% Sign table:
% \tkzTabInit[lgt=1.5,espcl=2]{$x$/1, $f(x)$/1}{$-\infty$, $-2$, $5$, $+\infty$}
% \tkzTabLine{,-,0,+,0,-,}

%% =============== TRIGONOMETRY ===============
% Unit circle and solution family:
% \draw (0,0) circle (2cm); \draw[->] (-2.5,0)--(2.5,0); \draw[->] (0,-2.5)--(0,2.5);
% \filldraw[red] (30:2) circle (2pt) node[above right] {$\pi/6 + k2\pi$};
% \draw[dashed, red] (30:2) -- (30:2 |- 0,0) node[below] {$\frac{\sqrt{3}}{2}$};

%% =============== FEASIBLE REGIONS ===============
% Region of x+y<=2 and x>=0:
% \begin{scope}
%   \clip (-1,-1) rectangle (3,3);
%   \fill[pattern=north east lines, pattern color=gray!50] (0,0) -- (0,2) -- (2,0) -- cycle;
%   \draw[thick] (0,2) -- (2,0) node[right] {$x+y=2$};
% \end{scope}

%% =============== SPACE GEOMETRY (3D) ===============
% Pyramid S.ABCD:
% \coordinate (A) at (0,0); \coordinate (B) at (1.5,-1); \coordinate (C) at (4.5,-1); \coordinate (D) at (3,0);
% \coordinate (S) at (2,4);
% \draw (S)--(A)--(B)--(C)--(S)--(B) (S)--(D)--(C); \draw[dashed] (A)--(D)--(S) (A)--(C);

% Cylinder:
% \draw (0,0) ellipse (1.5 and 0.5); \draw (0,4) ellipse (1.5 and 0.5);
% \draw (-1.5,0) -- (-1.5,4) (1.5,0) -- (1.5,4);

%% =============== STATISTICS ===============
% Frequency histogram:
% \draw[fill=blue!20] (0,0) rectangle (1,3); \draw[fill=blue!20] (1,0) rectangle (2,5);
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MathTopic {
    #[default]
    PlaneGeometry,
    SpaceGeometry,
    VariationTables,
    FunctionGraphs,
    Trigonometry,
    Statistics,
}

impl MathTopic {
    pub const ALL: [MathTopic; 6] = [
        MathTopic::PlaneGeometry,
        MathTopic::SpaceGeometry,
        MathTopic::VariationTables,
        MathTopic::FunctionGraphs,
        MathTopic::Trigonometry,
        MathTopic::Statistics,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MathTopic::PlaneGeometry => "Plane geometry",
            MathTopic::SpaceGeometry => "Space geometry",
            MathTopic::VariationTables => "Variation and sign tables",
            MathTopic::FunctionGraphs => "Function graphs",
            MathTopic::Trigonometry => "Trigonometry",
            MathTopic::Statistics => "Statistics and charts",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MathTopic::PlaneGeometry => "plane-geometry",
            MathTopic::SpaceGeometry => "space-geometry",
            MathTopic::VariationTables => "variation-tables",
            MathTopic::FunctionGraphs => "function-graphs",
            MathTopic::Trigonometry => "trigonometry",
            MathTopic::Statistics => "statistics",
        }
    }
}

impl fmt::Display for MathTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown topic `{0}`")]
pub struct UnknownTopic(pub String);

impl FromStr for MathTopic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        MathTopic::ALL
            .into_iter()
            .find(|t| t.name() == wanted || t.label().to_ascii_lowercase().replace(' ', "-") == wanted)
            .ok_or_else(|| UnknownTopic(s.to_string()))
    }
}

pub fn description_to_markup(topic: MathTopic, description: &str) -> String {
    format!(
        "Context snippets:\n{SNIPPETS_CONTEXT}\n\nRequest: write TikZ code for the following description. Topic: {}. Requirement: {}. Remember the solid-line rule for plane figures.",
        topic.label(),
        description.trim()
    )
}

pub fn markup_to_vector(markup: &str) -> String {
    format!(
        "You are a TikZ to SVG compiler. Draw an SVG image from the TikZ code below.\n\
CRITICAL REQUIREMENTS:\n\
1. Compute coordinates exactly, especially projections and midpoints.\n\
2. Plane geometry: SOLID lines everywhere. NO dashed strokes.\n\
3. Return only the <svg>...</svg> code. No explanatory text.\n\
\n\
TikZ code to draw:\n{markup}"
    )
}

pub const IMAGE_TO_DESCRIPTION: &str = "Describe this geometry exercise in detail so that I can convert it to TikZ. Distinguish plane figures (solid lines) from space figures.";

pub const IMAGE_TO_MARKUP: &str = "Convert this image to TikZ code. Follow the rules: plane figures use solid lines; space figures use dashed lines for hidden edges.";
