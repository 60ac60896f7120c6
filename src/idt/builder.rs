// This module builds the inlining dependency tree depth-first. Starting at the root method the
// builder asks the abstract-interpreter collaborator to walk the method with the incoming
// abstract arguments; the returned summary scores the node (static benefit) and the returned call
// sites are resolved into call targets. Every accepted target becomes a child paying its bytecode
// size out of the remaining budget. If budget is left the builder recurses into the callee with
// the argument values flowing from the call site, otherwise the child stays a scored leaf. The
// recursion budget strictly decreases along a path (a zero-size callee still costs one unit), and
// targets are filtered by policy: unresolvable or vetoed targets, targets already inlined
// elsewhere, extra targets of polymorphic sites, recursion beyond the self-inlining limit and
// paths deeper than the configured maximum.

//! Depth-first construction of the dependency tree.

use super::node::NodeId;
use super::tree::Idt;
use crate::absint::AbsValue;
use crate::core::{AbstractInterpreter, CallTarget, InlinerConfig, InliningSession};

/// Builds an [`Idt`] by driving an [`AbstractInterpreter`].
pub struct IdtBuilder<'c, A: AbstractInterpreter> {
    interpreter: &'c mut A,
    config: &'c InlinerConfig,
    /// Methods currently being expanded, root first.
    call_stack: Vec<A::MethodRef>,
}

impl<'c, A: AbstractInterpreter> IdtBuilder<'c, A> {
    pub fn new(interpreter: &'c mut A, config: &'c InlinerConfig) -> Self {
        Self { interpreter, config, call_stack: Vec::new() }
    }

    /// Build the tree for `root` under `budget`.
    pub fn build<'arena>(
        mut self,
        session: &'arena InliningSession<'arena>,
        root: A::MethodRef,
        budget: i64,
    ) -> Idt<'arena, A::MethodRef> {
        let size = self.interpreter.bytecode_size(root);
        let signature = self.interpreter.signature(root).to_string();
        let mut idt = Idt::new(session, root, &signature, size, budget);

        let arguments: Vec<AbsValue> = self
            .interpreter
            .parameter_types(root)
            .into_iter()
            .enumerate()
            .map(|(pos, ty)| AbsValue::top(ty).with_param_position(pos as u32))
            .collect();

        log::debug!("Building IDT for {} with budget {}", signature, budget);
        self.visit(&mut idt, NodeId::ROOT, &arguments, budget);
        log::debug!("IDT for {} has {} nodes, total cost {}", signature, idt.num_nodes(), idt.total_cost());
        idt
    }

    /// Score `node` and, if `budget` allows, expand its call sites.
    fn visit(
        &mut self,
        idt: &mut Idt<'_, A::MethodRef>,
        node: NodeId,
        arguments: &[AbsValue],
        budget: i64,
    ) {
        let method = idt.node(node).method();
        let analysis = self.interpreter.interpret(method, arguments);
        let static_benefit = analysis
            .summary
            .static_benefit(arguments, self.interpreter.class_hierarchy());
        idt.set_summary(node, analysis.summary, static_benefit);

        if budget <= 0 {
            log::trace!("IDT node {} is a leaf: budget exhausted", node.0);
            return;
        }
        if idt.node(node).caller_index() >= self.config.max_depth {
            log::debug!("IDT node {} is a leaf: depth limit {}", node.0, self.config.max_depth);
            return;
        }

        self.call_stack.push(method);
        for site in &analysis.call_sites {
            let targets = self.interpreter.resolve_targets(method, site);
            for (idx, target) in targets.into_iter().enumerate() {
                if !self.accept_target(idx, &target) {
                    idt.session().record_target_rejected();
                    continue;
                }

                let size = self.interpreter.bytecode_size(target.method);
                let signature = self.interpreter.signature(target.method).to_string();
                let child = idt.add_child(
                    node,
                    target.method,
                    &signature,
                    site.kind,
                    site.bc_index,
                    site.call_ratio,
                    size,
                );

                // The path budget always shrinks, even for empty callees.
                let child_budget = budget - size.max(1) as i64;
                self.visit(idt, child, &site.arguments, child_budget);
            }
        }
        self.call_stack.pop();
    }

    fn accept_target(&self, idx: usize, target: &CallTarget<A::MethodRef>) -> bool {
        if idx > 0 && !self.config.allow_multiple_targets {
            log::debug!("Dropping extra target {:?}: multiple targets disabled", target.method);
            return false;
        }
        if !target.inlineable {
            log::debug!("Dropping target {:?}: not inlineable", target.method);
            return false;
        }
        if target.already_inlined {
            log::debug!("Dropping target {:?}: already inlined", target.method);
            return false;
        }
        let occurrences = self.call_stack.iter().filter(|m| **m == target.method).count();
        if occurrences >= self.config.self_inlining_limit {
            log::debug!(
                "Dropping recursive target {:?}: on the call stack {} times",
                target.method,
                occurrences
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::absint::{
        ClassId, DataType, InliningMethodSummary, PotentialOptimization,
        PotentialOptimizationPredicate,
    };
    use crate::core::{
        CallKind, CallSiteInfo, CallTargetResolver, ClassHierarchy, MethodAnalysis,
    };
    use bumpalo::Bump;

    struct Flat;

    impl ClassHierarchy for Flat {
        fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool {
            sub == sup
        }
    }

    /// Methods are indices into `calls`; each call is `(bc, callee, ratio, arg)`.
    struct Graph {
        sizes: Vec<u32>,
        calls: Vec<Vec<(u32, u32, f64, i64)>>,
        names: Vec<String>,
        interpreted: Vec<(u32, Vec<AbsValue>)>,
        vetoed: Vec<u32>,
        extra_target: Option<(u32, u32)>,
    }

    impl Graph {
        fn new(sizes: &[u32], calls: Vec<Vec<(u32, u32, f64, i64)>>) -> Self {
            Self {
                sizes: sizes.to_vec(),
                names: (0..sizes.len()).map(|i| format!("m{}", i)).collect(),
                calls,
                interpreted: Vec::new(),
                vetoed: Vec::new(),
                extra_target: None,
            }
        }
    }

    impl CallTargetResolver for Graph {
        type MethodRef = u32;

        fn resolve_targets(&self, _caller: u32, site: &CallSiteInfo<u32>) -> Vec<CallTarget<u32>> {
            let mut target = CallTarget::new(site.callee);
            target.inlineable = !self.vetoed.contains(&site.callee);
            let mut targets = vec![target];
            if let Some((callee, extra)) = self.extra_target {
                if callee == site.callee {
                    targets.push(CallTarget::new(extra));
                }
            }
            targets
        }

        fn bytecode_size(&self, method: u32) -> u32 {
            self.sizes[method as usize]
        }

        fn signature(&self, method: u32) -> &str {
            &self.names[method as usize]
        }

        fn parameter_types(&self, _method: u32) -> Vec<DataType> {
            vec![DataType::Int32]
        }
    }

    impl AbstractInterpreter for Graph {
        fn interpret(&mut self, method: u32, arguments: &[AbsValue]) -> MethodAnalysis<u32> {
            self.interpreted.push((method, arguments.to_vec()));
            let mut summary = InliningMethodSummary::new();
            summary.add_predicate(
                0,
                PotentialOptimizationPredicate::new(
                    2,
                    PotentialOptimization::BranchFolding,
                    AbsValue::int_range(0, 10),
                ),
            );
            let call_sites = self.calls[method as usize]
                .iter()
                .map(|&(bc_index, callee, call_ratio, arg)| CallSiteInfo {
                    bc_index,
                    kind: CallKind::Static,
                    callee,
                    call_ratio,
                    arguments: vec![AbsValue::int_const(arg)],
                })
                .collect();
            MethodAnalysis { call_sites, summary }
        }

        fn class_hierarchy(&self) -> &dyn ClassHierarchy {
            &Flat
        }
    }

    #[test]
    fn test_builds_tree_with_benefits() {
        // m0 -> m1 (arg 5, scores) -> m3
        //    -> m2 (arg 50, does not score)
        let mut graph = Graph::new(
            &[30, 10, 20, 5],
            vec![vec![(1, 1, 0.5, 5), (4, 2, 1.0, 50)], vec![(2, 3, 1.0, 1)], vec![], vec![]],
        );
        let config = InlinerConfig::default();
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let idt = IdtBuilder::new(&mut graph, &config).build(&session, 0, 100);

        assert_eq!(idt.num_nodes(), 4);
        assert_eq!(idt.root().static_benefit(), 0);
        let m1 = idt.find_child_with_bytecode_index(NodeId::ROOT, 1).unwrap();
        let m2 = idt.find_child_with_bytecode_index(NodeId::ROOT, 4).unwrap();
        assert_eq!(idt.node(m1).static_benefit(), 1);
        assert_eq!(idt.node(m2).static_benefit(), 0);
        assert_eq!(idt.node(m1).benefit(), 0.5 * 2.0 * 10.0);
        assert_eq!(idt.node(m1).budget(), 90);
        let m3 = idt.find_child_with_bytecode_index(m1, 2).unwrap();
        assert_eq!(idt.node(m3).budget(), 85);
        assert_eq!(idt.node(m3).caller_index(), 2);
        assert_eq!(idt.total_cost(), 35);

        // The root sees Top parameters, callees see the call-site values.
        assert!(graph.interpreted[0].1[0].is_top());
        assert_eq!(graph.interpreted[0].1[0].param_position(), Some(0));
        assert_eq!(graph.interpreted[1], (1, vec![AbsValue::int_const(5)]));
    }

    #[test]
    fn test_over_budget_callee_is_scored_leaf() {
        // m1 costs more than the budget; its call to m2 is never explored.
        let mut graph = Graph::new(&[10, 80, 5], vec![vec![(3, 1, 1.0, 1)], vec![(1, 2, 1.0, 1)], vec![]]);
        let config = InlinerConfig::default();
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let idt = IdtBuilder::new(&mut graph, &config).build(&session, 0, 50);

        assert_eq!(idt.num_nodes(), 2);
        let leaf = idt.node(NodeId(1));
        assert_eq!(leaf.budget(), -30);
        assert_eq!(leaf.static_benefit(), 1);
        assert_eq!(leaf.num_children(), 0);
    }

    #[test]
    fn test_zero_size_recursion_terminates() {
        // m1 is empty and calls itself; the self-inlining limit and the shrinking
        // path budget both bound the chain.
        let mut graph = Graph::new(&[10, 0], vec![vec![(0, 1, 1.0, 0)], vec![(0, 1, 1.0, 0)]]);
        let config = InlinerConfig { self_inlining_limit: 100, ..InlinerConfig::default() };
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let idt = IdtBuilder::new(&mut graph, &config).build(&session, 0, 4);

        // root plus four unit-cost steps; the fourth exhausts the path budget
        assert_eq!(idt.num_nodes(), 5);
        assert!(idt.flatten_idt().iter().all(|n| n.cost() == 0));
    }

    #[test]
    fn test_self_inlining_limit() {
        let mut graph = Graph::new(&[10, 1], vec![vec![(0, 1, 1.0, 0)], vec![(0, 1, 1.0, 0)]]);
        let config = InlinerConfig { self_inlining_limit: 2, ..InlinerConfig::default() };
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let idt = IdtBuilder::new(&mut graph, &config).build(&session, 0, 1000);

        // root, m1, m1 again; the third m1 would put it on the stack twice.
        assert_eq!(idt.num_nodes(), 3);
        assert_eq!(session.stats().targets_rejected, 1);
    }

    #[test]
    fn test_policy_rejections() {
        let mut graph = Graph::new(&[10, 5, 5, 5], vec![vec![(0, 1, 1.0, 0), (1, 2, 1.0, 0)], vec![], vec![], vec![]]);
        graph.vetoed.push(2);
        graph.extra_target = Some((1, 3));

        let config = InlinerConfig::default();
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let idt = IdtBuilder::new(&mut graph, &config).build(&session, 0, 100);
        assert_eq!(idt.num_nodes(), 2);
        assert_eq!(session.stats().targets_rejected, 2);

        let config = InlinerConfig { allow_multiple_targets: true, ..InlinerConfig::default() };
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let idt = IdtBuilder::new(&mut graph, &config).build(&session, 0, 100);
        assert_eq!(idt.num_nodes(), 3);
        assert_eq!(idt.node(NodeId(1)).bc_index(), idt.node(NodeId(2)).bc_index());
    }

    #[test]
    fn test_depth_limit() {
        let mut graph = Graph::new(&[1, 1], vec![vec![(0, 1, 1.0, 0)], vec![(0, 1, 1.0, 0)]]);
        let config = InlinerConfig { self_inlining_limit: 100, max_depth: 3, ..InlinerConfig::default() };
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let idt = IdtBuilder::new(&mut graph, &config).build(&session, 0, 1000);
        assert_eq!(idt.num_nodes(), 4);
    }
}
