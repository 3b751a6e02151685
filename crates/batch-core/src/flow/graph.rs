use std::fmt;

use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Step(String),
    /// Fin del job COMPLETED, opcionalmente con un exit code propio.
    End { exit_code: Option<String> },
    /// Fuerza job FAILED aunque el step haya terminado bien.
    Fail,
    /// Job STOPPED (reiniciable).
    Stop,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Step(s) => write!(f, "{s}"),
            Target::End { exit_code: Some(c) } => write!(f, "<end:{c}>"),
            Target::End { exit_code: None } => write!(f, "<end>"),
            Target::Fail => write!(f, "<fail>"),
            Target::Stop => write!(f, "<stop>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub pattern: String,
    pub target: Target,
}

impl Transition {
    pub fn is_wildcard(&self) -> bool {
        self.pattern.contains(['*', '?'])
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Route<'a> {
    Edge(&'a Transition),
    Implicit,
    DeadEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowGraph {
    start: String,
    transitions: IndexMap<String, Vec<Transition>>,
}

impl FlowGraph {
    pub(crate) fn new(start: String, transitions: IndexMap<String, Vec<Transition>>) -> Self {
        Self { start, transitions }
    }

    /// Flujo lineal: cada step va al siguiente salvo con exit `FAILED`, que
    /// termina el job en fallo. El último step cierra de forma implícita.
    pub fn linear<S: AsRef<str>>(steps: &[S]) -> Option<Self> {
        let first = steps.first()?;
        let mut b = super::FlowBuilder::start(first.as_ref());
        for s in &steps[1..] {
            b = b.next(s.as_ref());
        }
        b.build().ok()
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn transitions_from(&self, step: &str) -> &[Transition] {
        self.transitions.get(step).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Todos los nombres de step referenciados (origen, destino o inicio).
    pub fn step_names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = vec![self.start.as_str()];
        for (from, ts) in &self.transitions {
            out.push(from);
            for t in ts {
                if let Target::Step(s) = &t.target {
                    out.push(s);
                }
            }
        }
        let mut seen = std::collections::HashSet::new();
        out.retain(|s| seen.insert(*s));
        out
    }

    pub fn route(&self, step: &str, exit_code: &str) -> Route<'_> {
        let edges = self.transitions_from(step);
        if edges.is_empty() {
            return Route::Implicit;
        }
        if let Some(t) = edges.iter().find(|t| !t.is_wildcard() && t.pattern == exit_code) {
            return Route::Edge(t);
        }
        match edges.iter().find(|t| t.is_wildcard() && glob_match(&t.pattern, exit_code)) {
            Some(t) => Route::Edge(t),
            None => Route::DeadEnd,
        }
    }
}

/// Glob mínimo: `*` = cualquier secuencia, `?` = un carácter.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
