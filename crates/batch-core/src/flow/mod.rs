//! Grafo de flujo: nodos = steps, aristas = (step origen, patrón de exit
//! code, destino).
//!
//! Resolución tras cada step:
//! 1. patrón exacto igual al exit code;
//! 2. si no, el primer patrón comodín (`*`, `?`) que coincida, en orden de
//!    declaración;
//! 3. sin aristas para el step: final implícito (el estado del job se deriva
//!    del step); con aristas pero ninguna coincide: dead end (job FAILED).

mod builder;
mod graph;

pub use builder::{FlowBuilder, TransitionBuilder};
pub use graph::{glob_match, FlowGraph, Route, Target, Transition};
