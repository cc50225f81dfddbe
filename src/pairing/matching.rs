//! Maximum-weight matching on general graphs.
//!
//! Edmonds' blossom algorithm in its primal-dual form (O(V³)). Odd cycles of
//! alternating edges are shrunk into blossoms so augmenting paths through
//! them are found, which a bipartite matcher cannot do. In max-cardinality
//! mode the result has the largest possible number of edges, and the largest
//! total weight among those.
//!
//! Everything is integral: weights are doubled internally so every dual
//! adjustment divides exactly. Vertices and edges are scanned in index order,
//! so equal-weight optima always resolve the same way.

use super::quality::Weight;
use super::PairingError;

/// Compute a maximum-weight matching.
///
/// `edges` are `(i, j, weight)` with `i != j`, both below `vertex_count`.
/// Returns the partner of every vertex, `None` for unmatched vertices.
pub fn max_weight_matching(
    vertex_count: usize,
    edges: &[(usize, usize, Weight)],
    max_cardinality: bool,
) -> Result<Vec<Option<usize>>, PairingError> {
    for &(i, j, _) in edges {
        if i == j || i >= vertex_count || j >= vertex_count {
            return Err(PairingError::InvariantViolation(format!(
                "edge ({}, {}) invalid for {} vertices",
                i, j, vertex_count
            )));
        }
    }
    if edges.is_empty() {
        return Ok(vec![None; vertex_count]);
    }

    let mut solver = Blossom::new(vertex_count, edges);
    solver.solve(max_cardinality)?;
    Ok(solver.partners())
}

/// Total weight of a partner vector, counting each pair once.
pub fn matching_weight(
    partners: &[Option<usize>],
    edges: &[(usize, usize, Weight)],
) -> Weight {
    edges
        .iter()
        .filter(|&&(i, j, _)| partners[i] == Some(j))
        .map(|&(_, _, w)| w)
        .sum()
}

fn require<T>(value: Option<T>, context: &str) -> Result<T, PairingError> {
    value.ok_or_else(|| PairingError::InvariantViolation(format!("blossom matcher: {}", context)))
}

const FREE: u8 = 0;
const OUTER: u8 = 1;
const INNER: u8 = 2;
const BREADCRUMB: u8 = 4;

/// Solver state. Endpoint `p` of edge `k = p / 2` is `endpoint[p]`; `p ^ 1`
/// is the other end. Indices `0..n` are vertices, `n..2n` blossoms.
struct Blossom {
    n: usize,
    edges: Vec<(usize, usize, Weight)>,
    endpoint: Vec<usize>,
    neighbend: Vec<Vec<usize>>,
    mate: Vec<Option<usize>>,
    label: Vec<u8>,
    labelend: Vec<Option<usize>>,
    inblossom: Vec<usize>,
    blossomparent: Vec<Option<usize>>,
    blossomchilds: Vec<Vec<usize>>,
    blossombase: Vec<Option<usize>>,
    blossomendps: Vec<Vec<usize>>,
    bestedge: Vec<Option<usize>>,
    blossombestedges: Vec<Option<Vec<usize>>>,
    unusedblossoms: Vec<usize>,
    dualvar: Vec<Weight>,
    allowedge: Vec<bool>,
    queue: Vec<usize>,
}

/// Index into a cyclic child list with possibly negative `j`.
fn cyc(j: isize, len: usize) -> usize {
    j.rem_euclid(len as isize) as usize
}

impl Blossom {
    fn new(n: usize, edges: &[(usize, usize, Weight)]) -> Self {
        let edges: Vec<(usize, usize, Weight)> =
            edges.iter().map(|&(i, j, w)| (i, j, 2 * w)).collect();
        let max_weight = edges.iter().map(|&(_, _, w)| w).max().unwrap_or(0).max(0);

        let mut endpoint = Vec::with_capacity(2 * edges.len());
        let mut neighbend = vec![Vec::new(); n];
        for (k, &(i, j, _)) in edges.iter().enumerate() {
            endpoint.push(i);
            endpoint.push(j);
            neighbend[i].push(2 * k + 1);
            neighbend[j].push(2 * k);
        }

        let mut dualvar = vec![max_weight; n];
        dualvar.extend(std::iter::repeat(0).take(n));
        let mut blossombase: Vec<Option<usize>> = (0..n).map(Some).collect();
        blossombase.extend(std::iter::repeat(None).take(n));

        let nedge = edges.len();
        Self {
            n,
            edges,
            endpoint,
            neighbend,
            mate: vec![None; n],
            label: vec![FREE; 2 * n],
            labelend: vec![None; 2 * n],
            inblossom: (0..n).collect(),
            blossomparent: vec![None; 2 * n],
            blossomchilds: vec![Vec::new(); 2 * n],
            blossombase,
            blossomendps: vec![Vec::new(); 2 * n],
            bestedge: vec![None; 2 * n],
            blossombestedges: vec![None; 2 * n],
            unusedblossoms: (n..2 * n).collect(),
            dualvar,
            allowedge: vec![false; nedge],
            queue: Vec::new(),
        }
    }

    fn partners(&self) -> Vec<Option<usize>> {
        self.mate.iter().map(|m| m.map(|p| self.endpoint[p])).collect()
    }

    fn slack(&self, k: usize) -> Weight {
        let (i, j, w) = self.edges[k];
        self.dualvar[i] + self.dualvar[j] - 2 * w
    }

    fn leaves(&self, b: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_leaves(b, &mut out);
        out
    }

    fn collect_leaves(&self, b: usize, out: &mut Vec<usize>) {
        if b < self.n {
            out.push(b);
        } else {
            for &t in &self.blossomchilds[b] {
                self.collect_leaves(t, out);
            }
        }
    }

    /// Label the top-level blossom containing `w` and, for an inner label,
    /// the mate of its base.
    fn assign_label(&mut self, w: usize, t: u8, p: Option<usize>) -> Result<(), PairingError> {
        let b = self.inblossom[w];
        self.label[w] = t;
        self.label[b] = t;
        self.labelend[w] = p;
        self.labelend[b] = p;
        self.bestedge[w] = None;
        self.bestedge[b] = None;
        if t == OUTER {
            let leaves = self.leaves(b);
            self.queue.extend(leaves);
        } else if t == INNER {
            let base = require(self.blossombase[b], "inner blossom without base")?;
            let m = require(self.mate[base], "inner blossom base is unmatched")?;
            self.assign_label(self.endpoint[m], OUTER, Some(m ^ 1))?;
        }
        Ok(())
    }

    /// Trace back from `v` and `w` to find a new blossom's base, or `None`
    /// when the two trees are distinct (an augmenting path).
    fn scan_blossom(&mut self, v: usize, w: usize) -> Result<Option<usize>, PairingError> {
        let mut path = Vec::new();
        let mut base = None;
        let mut v = v;
        let mut w = Some(w);

        loop {
            let b = self.inblossom[v];
            if self.label[b] & BREADCRUMB != 0 {
                base = self.blossombase[b];
                break;
            }
            path.push(b);
            self.label[b] = OUTER | BREADCRUMB;

            let next = match self.labelend[b] {
                None => None,
                Some(le) => {
                    let t = self.endpoint[le];
                    let bt = self.inblossom[t];
                    let le = require(self.labelend[bt], "inner blossom without label edge")?;
                    Some(self.endpoint[le])
                }
            };

            match (next, w) {
                (next, Some(other)) => {
                    v = other;
                    w = next;
                }
                (Some(next), None) => v = next,
                (None, None) => break,
            }
        }

        for b in path {
            self.label[b] = OUTER;
        }
        Ok(base)
    }

    /// Shrink the odd cycle closed by edge `k` into a new blossom rooted at `base`.
    fn add_blossom(&mut self, base: usize, k: usize) -> Result<(), PairingError> {
        let (v, w, _) = self.edges[k];
        let bb = self.inblossom[base];
        let mut bv = self.inblossom[v];
        let mut bw = self.inblossom[w];
        let b = require(self.unusedblossoms.pop(), "out of blossom slots")?;

        self.blossombase[b] = Some(base);
        self.blossomparent[b] = None;
        self.blossomparent[bb] = Some(b);

        let mut path = Vec::new();
        let mut endps = Vec::new();
        while bv != bb {
            self.blossomparent[bv] = Some(b);
            path.push(bv);
            let le = require(self.labelend[bv], "blossom path vertex without label edge")?;
            endps.push(le);
            bv = self.inblossom[self.endpoint[le]];
        }
        path.push(bb);
        path.reverse();
        endps.reverse();
        endps.push(2 * k);
        while bw != bb {
            self.blossomparent[bw] = Some(b);
            path.push(bw);
            let le = require(self.labelend[bw], "blossom path vertex without label edge")?;
            endps.push(le ^ 1);
            bw = self.inblossom[self.endpoint[le]];
        }

        self.blossomchilds[b] = path.clone();
        self.blossomendps[b] = endps;
        self.label[b] = OUTER;
        self.labelend[b] = self.labelend[bb];
        self.dualvar[b] = 0;

        for leaf in self.leaves(b) {
            if self.label[self.inblossom[leaf]] == INNER {
                self.queue.push(leaf);
            }
            self.inblossom[leaf] = b;
        }

        // Least-slack edges from the new blossom to each neighbouring outer blossom
        let mut bestedgeto: Vec<Option<usize>> = vec![None; 2 * self.n];
        for &child in &path {
            let nblists: Vec<Vec<usize>> = match self.blossombestedges[child].take() {
                Some(list) => vec![list],
                None => self
                    .leaves(child)
                    .into_iter()
                    .map(|leaf| self.neighbend[leaf].iter().map(|p| p / 2).collect())
                    .collect(),
            };
            for nblist in nblists {
                for k in nblist {
                    let (i, j, _) = self.edges[k];
                    let j = if self.inblossom[j] == b { i } else { j };
                    let bj = self.inblossom[j];
                    if bj != b
                        && self.label[bj] == OUTER
                        && bestedgeto[bj].map_or(true, |cur| self.slack(k) < self.slack(cur))
                    {
                        bestedgeto[bj] = Some(k);
                    }
                }
            }
            self.bestedge[child] = None;
        }

        let best: Vec<usize> = bestedgeto.into_iter().flatten().collect();
        self.bestedge[b] = None;
        for &k in &best {
            if self.bestedge[b].map_or(true, |cur| self.slack(k) < self.slack(cur)) {
                self.bestedge[b] = Some(k);
            }
        }
        self.blossombestedges[b] = Some(best);
        Ok(())
    }

    /// Dissolve blossom `b`, relabelling its children when it is expanded mid-stage.
    fn expand_blossom(&mut self, b: usize, endstage: bool) -> Result<(), PairingError> {
        let childs = self.blossomchilds[b].clone();
        for &s in &childs {
            self.blossomparent[s] = None;
            if s < self.n {
                self.inblossom[s] = s;
            } else if endstage && self.dualvar[s] == 0 {
                self.expand_blossom(s, endstage)?;
            } else {
                for leaf in self.leaves(s) {
                    self.inblossom[leaf] = s;
                }
            }
        }

        if !endstage && self.label[b] == INNER {
            let len = childs.len();
            let lb = require(self.labelend[b], "inner blossom without label edge")?;
            let entrychild = self.inblossom[self.endpoint[lb ^ 1]];
            let mut j = require(
                childs.iter().position(|&c| c == entrychild),
                "entry child not in blossom",
            )? as isize;
            let (jstep, endptrick): (isize, usize) = if j & 1 == 1 {
                j -= len as isize;
                (1, 0)
            } else {
                (-1, 1)
            };

            let mut p = lb;
            while j != 0 {
                let ep = self.blossomendps[b][cyc(j - endptrick as isize, len)];
                self.label[self.endpoint[p ^ 1]] = FREE;
                self.label[self.endpoint[ep ^ endptrick ^ 1]] = FREE;
                self.assign_label(self.endpoint[p ^ 1], INNER, Some(p))?;
                self.allowedge[ep / 2] = true;
                j += jstep;
                p = self.blossomendps[b][cyc(j - endptrick as isize, len)] ^ endptrick;
                self.allowedge[p / 2] = true;
                j += jstep;
            }

            let bv = childs[cyc(j, len)];
            let entry = self.endpoint[p ^ 1];
            self.label[entry] = INNER;
            self.label[bv] = INNER;
            self.labelend[entry] = Some(p);
            self.labelend[bv] = Some(p);
            self.bestedge[bv] = None;
            j += jstep;

            while childs[cyc(j, len)] != entrychild {
                let bv = childs[cyc(j, len)];
                if self.label[bv] == OUTER {
                    j += jstep;
                    continue;
                }
                let labelled = self
                    .leaves(bv)
                    .into_iter()
                    .find(|&leaf| self.label[leaf] != FREE);
                if let Some(leaf) = labelled {
                    self.label[leaf] = FREE;
                    let base = require(self.blossombase[bv], "sub-blossom without base")?;
                    let m = require(self.mate[base], "sub-blossom base is unmatched")?;
                    self.label[self.endpoint[m]] = FREE;
                    self.assign_label(leaf, INNER, self.labelend[leaf])?;
                }
                j += jstep;
            }
        }

        self.label[b] = FREE;
        self.labelend[b] = None;
        self.blossomchilds[b].clear();
        self.blossomendps[b].clear();
        self.blossombase[b] = None;
        self.blossombestedges[b] = None;
        self.bestedge[b] = None;
        self.unusedblossoms.push(b);
        Ok(())
    }

    /// Flip matched and unmatched edges along the even path from `v` to the
    /// base of blossom `b`, making `v` the new base.
    fn augment_blossom(&mut self, b: usize, v: usize) -> Result<(), PairingError> {
        let mut t = v;
        while self.blossomparent[t] != Some(b) {
            t = require(self.blossomparent[t], "vertex outside the blossom being augmented")?;
        }
        if t >= self.n {
            self.augment_blossom(t, v)?;
        }

        let len = self.blossomchilds[b].len();
        let i = require(
            self.blossomchilds[b].iter().position(|&c| c == t),
            "child not in blossom",
        )?;
        let mut j = i as isize;
        let (jstep, endptrick): (isize, usize) = if i & 1 == 1 {
            j -= len as isize;
            (1, 0)
        } else {
            (-1, 1)
        };

        while j != 0 {
            j += jstep;
            let t = self.blossomchilds[b][cyc(j, len)];
            let p = self.blossomendps[b][cyc(j - endptrick as isize, len)] ^ endptrick;
            if t >= self.n {
                self.augment_blossom(t, self.endpoint[p])?;
            }
            j += jstep;
            let t = self.blossomchilds[b][cyc(j, len)];
            if t >= self.n {
                self.augment_blossom(t, self.endpoint[p ^ 1])?;
            }
            self.mate[self.endpoint[p]] = Some(p ^ 1);
            self.mate[self.endpoint[p ^ 1]] = Some(p);
        }

        self.blossomchilds[b].rotate_left(i);
        self.blossomendps[b].rotate_left(i);
        let first = self.blossomchilds[b][0];
        self.blossombase[b] = self.blossombase[first];
        Ok(())
    }

    /// Augment along the path through edge `k` between two outer trees.
    fn augment_matching(&mut self, k: usize) -> Result<(), PairingError> {
        let (v, w, _) = self.edges[k];
        for (s, p) in [(v, 2 * k + 1), (w, 2 * k)] {
            let (mut s, mut p) = (s, p);
            loop {
                let bs = self.inblossom[s];
                if bs >= self.n {
                    self.augment_blossom(bs, s)?;
                }
                self.mate[s] = Some(p);
                let Some(le) = self.labelend[bs] else {
                    break;
                };
                let t = self.endpoint[le];
                let bt = self.inblossom[t];
                let lbt = require(self.labelend[bt], "inner blossom without label edge")?;
                s = self.endpoint[lbt];
                let j = self.endpoint[lbt ^ 1];
                if bt >= self.n {
                    self.augment_blossom(bt, j)?;
                }
                self.mate[j] = Some(lbt);
                p = lbt ^ 1;
            }
        }
        Ok(())
    }

    fn solve(&mut self, max_cardinality: bool) -> Result<(), PairingError> {
        let n = self.n;

        for _stage in 0..n {
            self.label.fill(FREE);
            self.bestedge.fill(None);
            for b in n..2 * n {
                self.blossombestedges[b] = None;
            }
            self.allowedge.fill(false);
            self.queue.clear();

            for v in 0..n {
                if self.mate[v].is_none() && self.label[self.inblossom[v]] == FREE {
                    self.assign_label(v, OUTER, None)?;
                }
            }

            let mut augmented = false;
            loop {
                while !augmented {
                    let Some(v) = self.queue.pop() else {
                        break;
                    };
                    let neighbours = self.neighbend[v].clone();
                    for p in neighbours {
                        let k = p / 2;
                        let w = self.endpoint[p];
                        if self.inblossom[v] == self.inblossom[w] {
                            continue;
                        }

                        let mut kslack = 0;
                        if !self.allowedge[k] {
                            kslack = self.slack(k);
                            if kslack <= 0 {
                                self.allowedge[k] = true;
                            }
                        }

                        if self.allowedge[k] {
                            if self.label[self.inblossom[w]] == FREE {
                                self.assign_label(w, INNER, Some(p ^ 1))?;
                            } else if self.label[self.inblossom[w]] == OUTER {
                                match self.scan_blossom(v, w)? {
                                    Some(base) => self.add_blossom(base, k)?,
                                    None => {
                                        self.augment_matching(k)?;
                                        augmented = true;
                                        break;
                                    }
                                }
                            } else if self.label[w] == FREE {
                                self.label[w] = INNER;
                                self.labelend[w] = Some(p ^ 1);
                            }
                        } else if self.label[self.inblossom[w]] == OUTER {
                            let b = self.inblossom[v];
                            if self.bestedge[b].map_or(true, |cur| kslack < self.slack(cur)) {
                                self.bestedge[b] = Some(k);
                            }
                        } else if self.label[w] == FREE
                            && self.bestedge[w].map_or(true, |cur| kslack < self.slack(cur))
                        {
                            self.bestedge[w] = Some(k);
                        }
                    }
                }

                if augmented {
                    break;
                }

                // No augmenting path with the current duals: find the
                // smallest dual change that creates progress.
                let mut delta_kind = 0u8;
                let mut delta: Weight = 0;
                let mut delta_edge = None;
                let mut delta_blossom = None;

                if !max_cardinality {
                    delta_kind = 1;
                    delta = self.dualvar[..n].iter().copied().min().unwrap_or(0);
                }

                for v in 0..n {
                    if self.label[self.inblossom[v]] == FREE {
                        if let Some(k) = self.bestedge[v] {
                            let d = self.slack(k);
                            if delta_kind == 0 || d < delta {
                                delta = d;
                                delta_kind = 2;
                                delta_edge = Some(k);
                            }
                        }
                    }
                }

                for b in 0..2 * n {
                    if self.blossomparent[b].is_none() && self.label[b] == OUTER {
                        if let Some(k) = self.bestedge[b] {
                            let d = self.slack(k) / 2;
                            if delta_kind == 0 || d < delta {
                                delta = d;
                                delta_kind = 3;
                                delta_edge = Some(k);
                            }
                        }
                    }
                }

                for b in n..2 * n {
                    if self.blossombase[b].is_some()
                        && self.blossomparent[b].is_none()
                        && self.label[b] == INNER
                        && (delta_kind == 0 || self.dualvar[b] < delta)
                    {
                        delta = self.dualvar[b];
                        delta_kind = 4;
                        delta_blossom = Some(b);
                    }
                }

                if delta_kind == 0 {
                    // Max-cardinality mode with nothing left to grow
                    delta_kind = 1;
                    delta = self.dualvar[..n].iter().copied().min().unwrap_or(0).max(0);
                }

                for v in 0..n {
                    match self.label[self.inblossom[v]] {
                        OUTER => self.dualvar[v] -= delta,
                        INNER => self.dualvar[v] += delta,
                        _ => {}
                    }
                }
                for b in n..2 * n {
                    if self.blossombase[b].is_some() && self.blossomparent[b].is_none() {
                        match self.label[b] {
                            OUTER => self.dualvar[b] += delta,
                            INNER => self.dualvar[b] -= delta,
                            _ => {}
                        }
                    }
                }

                match delta_kind {
                    1 => break,
                    2 => {
                        let k = require(delta_edge, "delta edge missing")?;
                        self.allowedge[k] = true;
                        let (i, j, _) = self.edges[k];
                        let outer = if self.label[self.inblossom[i]] == FREE { j } else { i };
                        self.queue.push(outer);
                    }
                    3 => {
                        let k = require(delta_edge, "delta edge missing")?;
                        self.allowedge[k] = true;
                        let (i, _, _) = self.edges[k];
                        self.queue.push(i);
                    }
                    _ => {
                        let b = require(delta_blossom, "delta blossom missing")?;
                        self.expand_blossom(b, false)?;
                    }
                }
            }

            if !augmented {
                break;
            }

            for b in n..2 * n {
                if self.blossomparent[b].is_none()
                    && self.blossombase[b].is_some()
                    && self.label[b] == OUTER
                    && self.dualvar[b] == 0
                {
                    self.expand_blossom(b, true)?;
                }
            }
        }

        Ok(())
    }
}
