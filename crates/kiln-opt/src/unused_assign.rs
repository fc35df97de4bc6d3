//! Elimination of assignments whose value is never observed.
//!
//! Removes stores `x := e` (and initializers of `let x := e`) when no read
//! of `x` can see the written value before `x` is overwritten or goes out of
//! scope, provided `e` is movable. The analysis is intra-procedural: every
//! function definition is analyzed with fresh state and the top-level block
//! is treated as an implicit function without return variables.
//!
//! The pass runs in three phases over the same tree:
//!
//! 1. a numbering pre-pass gives every store a [`StoreId`], the key under
//!    which the analysis tracks it (removal must not happen during analysis,
//!    since it would invalidate exactly those keys);
//! 2. a forward analysis walks the tree once, tracking for every store
//!    whether it is still undecided, known unused, or known used, joining
//!    states where control paths merge and unfolding loop back edges;
//! 3. a removal pass drops the scheduled assignments and strips the
//!    initializers of scheduled declarations.
//!
//! Names are assumed unique across scopes (the input is alpha-renamed before
//! optimization), so analysis state can be keyed by name.

use std::collections::hash_map::Entry;

use kiln_ir::{
    iterate_replacing, Block, Dialect, Expression, ForLoop, FunctionDefinition, If, Name,
    Statement, StoreId, Switch,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::semantics::{self, ControlFlow};
use crate::OptContext;

/// Loop nesting depth up to which the loop body is unfolded a second time.
/// Deeper nests take the conservative shortcut instead, which bounds the
/// analysis to polynomial time.
const MAX_RERUN_NESTING_DEPTH: usize = 6;

/// Remove all unused, movable stores reachable from `block`.
pub fn eliminate_unused_assignments(ctx: &OptContext<'_>, block: &mut Block) {
    let mut next_id = 1;
    number_stores(&mut next_id, block);

    let mut eliminator = UnusedAssignEliminator::new(ctx.dialect);
    eliminator.visit_block(block);

    let pending = eliminator.pending_removals;
    tracing::debug!(stores = next_id - 1, removed = pending.len(), "unused assignment elimination");
    remove_stores(block, &pending);
}

// ============================================================================
// Numbering pre-pass
// ============================================================================

/// Assign a fresh id to every assignment and variable declaration.
fn number_stores(next_id: &mut u32, block: &mut Block) {
    for statement in &mut block.statements {
        match statement {
            Statement::Assignment(assignment) => {
                assignment.id = StoreId(*next_id);
                *next_id += 1;
            }
            Statement::VariableDeclaration(declaration) => {
                declaration.id = StoreId(*next_id);
                *next_id += 1;
            }
            Statement::Block(inner) => number_stores(next_id, inner),
            Statement::If(if_stmt) => number_stores(next_id, &mut if_stmt.body),
            Statement::Switch(switch) => {
                for case in &mut switch.cases {
                    number_stores(next_id, &mut case.body);
                }
            }
            Statement::ForLoop(for_loop) => {
                number_stores(next_id, &mut for_loop.pre);
                number_stores(next_id, &mut for_loop.post);
                number_stores(next_id, &mut for_loop.body);
            }
            Statement::FunctionDefinition(function) => number_stores(next_id, &mut function.body),
            Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Leave(_)
            | Statement::Expression(_) => {}
        }
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Fate of one tracked store along the current analysis path.
///
/// The variants are ordered so that `join` is `max`: joining an unused
/// branch with an undecided one must stay undecided, because the store can
/// still be read on the path that skipped the overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum State {
    Unused,
    Undecided,
    Used,
}

impl State {
    fn join(a: &mut State, b: State) {
        if *a < b {
            *a = b;
        }
    }
}

/// `variable -> store -> state` along the current analysis path
type TrackedStores = FxHashMap<Name, FxHashMap<StoreId, State>>;

/// Snapshots saved at `break`/`continue` statements of the innermost
/// unfinished loop, joined back in when the loop (or a variable's scope)
/// ends.
#[derive(Debug, Default)]
struct ForLoopInfo {
    pending_break_stores: Vec<TrackedStores>,
    pending_continue_stores: Vec<TrackedStores>,
}

struct UnusedAssignEliminator<'a> {
    dialect: &'a Dialect,
    stores: TrackedStores,
    /// Variables declared in the currently analyzed scope
    declared_variables: FxHashSet<Name>,
    /// Return variables of the enclosing function (empty at top level)
    return_variables: FxHashSet<Name>,
    for_loop_info: ForLoopInfo,
    loop_depth: usize,
    /// Oracle verdict for each store's value, taken when the store is first
    /// seen; the tree is not consulted again after that.
    movable_values: FxHashMap<StoreId, bool>,
    pending_removals: FxHashSet<StoreId>,
}

impl<'a> UnusedAssignEliminator<'a> {
    fn new(dialect: &'a Dialect) -> Self {
        Self {
            dialect,
            stores: TrackedStores::default(),
            declared_variables: FxHashSet::default(),
            return_variables: FxHashSet::default(),
            for_loop_info: ForLoopInfo::default(),
            loop_depth: 0,
            movable_values: FxHashMap::default(),
            pending_removals: FxHashSet::default(),
        }
    }

    fn visit_block(&mut self, block: &Block) {
        let outer_declared = std::mem::take(&mut self.declared_variables);
        let stores_on_entry = self.stores.clone();

        for statement in &block.statements {
            self.visit_statement(statement);
        }

        // If the block cannot flow out of its end, stores introduced inside
        // it that are still undecided will never be observed.
        if let Some(last) = block.statements.last() {
            match semantics::control_flow_kind(self.dialect, last) {
                ControlFlow::Leave | ControlFlow::Terminate => {
                    self.mark_new_stores_unused(&stores_on_entry)
                }
                ControlFlow::FlowOut | ControlFlow::Break | ControlFlow::Continue => {}
            }
        }

        let declared = std::mem::replace(&mut self.declared_variables, outer_declared);
        for name in &declared {
            self.finalize(name, State::Unused);
        }
    }

    fn visit_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Block(block) => self.visit_block(block),
            Statement::VariableDeclaration(declaration) => {
                if let Some(value) = &declaration.value {
                    self.visit_expression(value);
                }
                for variable in &declaration.variables {
                    self.declared_variables.insert(variable.name.clone());
                }
                // A single-variable initializer is a store like any other;
                // removal strips the initializer but keeps the declaration.
                if declaration.variables.len() == 1 {
                    if let Some(value) = &declaration.value {
                        self.track(&declaration.variables[0].name, declaration.id, value);
                    }
                }
            }
            Statement::Assignment(assignment) => {
                self.visit_expression(&assignment.value);
                if let [target] = assignment.targets.as_slice() {
                    self.change_undecided_to(&target.name, State::Unused);
                    self.track(&target.name, assignment.id, &assignment.value);
                }
                // Multi-target assignments are visited for their reads only;
                // their targets are never tracked.
            }
            Statement::Expression(statement) => self.visit_expression(&statement.expression),
            Statement::If(if_stmt) => self.visit_if(if_stmt),
            Statement::Switch(switch) => self.visit_switch(switch),
            Statement::ForLoop(for_loop) => self.visit_for_loop(for_loop),
            Statement::FunctionDefinition(function) => self.visit_function(function),
            Statement::Break(_) => {
                let stores = std::mem::take(&mut self.stores);
                self.for_loop_info.pending_break_stores.push(stores);
            }
            Statement::Continue(_) => {
                let stores = std::mem::take(&mut self.stores);
                self.for_loop_info.pending_continue_stores.push(stores);
            }
            Statement::Leave(_) => {
                // The caller observes every return variable.
                let returns: Vec<Name> = self.return_variables.iter().cloned().collect();
                for name in &returns {
                    self.change_undecided_to(name, State::Used);
                }
            }
        }
    }

    fn visit_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Literal(_) => {}
            Expression::Identifier(identifier) => {
                self.change_undecided_to(&identifier.name, State::Used)
            }
            Expression::FunctionCall(call) => {
                for arg in &call.args {
                    self.visit_expression(arg);
                }
            }
        }
    }

    fn visit_if(&mut self, if_stmt: &If) {
        self.visit_expression(&if_stmt.condition);

        let skip_branch = self.stores.clone();
        self.visit_block(&if_stmt.body);

        merge(&mut self.stores, skip_branch);
    }

    fn visit_switch(&mut self, switch: &Switch) {
        self.visit_expression(&switch.expression);

        let before_switch = self.stores.clone();
        let mut has_default = false;
        let mut branches = Vec::new();
        for case in &switch.cases {
            if case.value.is_none() {
                has_default = true;
            }
            self.visit_block(&case.body);
            branches.push(std::mem::replace(&mut self.stores, before_switch.clone()));
        }

        if has_default {
            // Some case always runs; the pre-switch state is not a
            // surviving path.
            if let Some(branch) = branches.pop() {
                self.stores = branch;
            }
        }
        for branch in branches {
            merge(&mut self.stores, branch);
        }
    }

    fn visit_for_loop(&mut self, for_loop: &ForLoop) {
        let outer_declared = std::mem::take(&mut self.declared_variables);
        let outer_loop_info = std::mem::take(&mut self.for_loop_info);
        self.loop_depth += 1;

        // The pre block runs once, in the loop's own scope.
        for statement in &for_loop.pre.statements {
            self.visit_statement(statement);
        }

        self.visit_expression(&for_loop.condition);
        let zero_runs = self.stores.clone();

        self.visit_block(&for_loop.body);
        self.absorb_pending_continues();
        self.visit_block(&for_loop.post);
        self.visit_expression(&for_loop.condition);

        if self.loop_depth < MAX_RERUN_NESTING_DEPTH {
            // One more unfolding reaches the fixpoint: with three states per
            // store, a further pass over the back edge cannot change the
            // joined result.
            let one_run = self.stores.clone();
            self.visit_block(&for_loop.body);
            self.absorb_pending_continues();
            self.visit_block(&for_loop.post);
            self.visit_expression(&for_loop.condition);
            merge(&mut self.stores, one_run);
        } else {
            self.shortcut_nested_loop(&zero_runs);
        }

        // Join order does not matter; the join is commutative and
        // associative.
        merge(&mut self.stores, zero_runs);
        let breaks = std::mem::take(&mut self.for_loop_info.pending_break_stores);
        for snapshot in breaks {
            merge(&mut self.stores, snapshot);
        }

        self.loop_depth -= 1;
        self.for_loop_info = outer_loop_info;

        let declared = std::mem::replace(&mut self.declared_variables, outer_declared);
        for name in &declared {
            self.finalize(name, State::Unused);
        }
    }

    fn visit_function(&mut self, function: &FunctionDefinition) {
        let outer_declared = std::mem::take(&mut self.declared_variables);
        let outer_returns = std::mem::take(&mut self.return_variables);
        let outer_stores = std::mem::take(&mut self.stores);
        let outer_loop_info = std::mem::take(&mut self.for_loop_info);
        let outer_depth = std::mem::replace(&mut self.loop_depth, 0);

        for ret in &function.return_variables {
            self.return_variables.insert(ret.name.clone());
        }

        self.visit_block(&function.body);

        for parameter in &function.parameters {
            self.finalize(&parameter.name, State::Unused);
        }
        // Return variables are live on every exit path.
        for ret in &function.return_variables {
            self.finalize(&ret.name, State::Used);
        }

        self.declared_variables = outer_declared;
        self.return_variables = outer_returns;
        self.stores = outer_stores;
        self.for_loop_info = outer_loop_info;
        self.loop_depth = outer_depth;
    }

    /// Begin tracking a store, leaving an already-known state untouched
    /// (loop unfolding visits the same store twice).
    fn track(&mut self, name: &Name, id: StoreId, value: &Expression) {
        let dialect = self.dialect;
        self.movable_values
            .entry(id)
            .or_insert_with(|| semantics::is_movable(dialect, value));
        self.stores
            .entry(name.clone())
            .or_default()
            .entry(id)
            .or_insert(State::Undecided);
    }

    fn change_undecided_to(&mut self, name: &Name, new_state: State) {
        if let Some(stores) = self.stores.get_mut(name) {
            for state in stores.values_mut() {
                if *state == State::Undecided {
                    *state = new_state;
                }
            }
        }
    }

    /// Mark stores that appeared since `on_entry` and are still undecided as
    /// unused; used when a block ends in a statement control cannot flow out
    /// of.
    fn mark_new_stores_unused(&mut self, on_entry: &TrackedStores) {
        for (name, stores) in &mut self.stores {
            for (id, state) in stores.iter_mut() {
                if *state != State::Undecided {
                    continue;
                }
                let known_on_entry = on_entry
                    .get(name)
                    .map_or(false, |stores| stores.contains_key(id));
                if !known_on_entry {
                    *state = State::Unused;
                }
            }
        }
    }

    /// Conservative replacement for the second loop unfolding: every store
    /// newly introduced inside the loop is pinned as used and thereby kept.
    /// Break and continue snapshots need no special handling; they are
    /// joined in later anyway.
    fn shortcut_nested_loop(&mut self, zero_runs: &TrackedStores) {
        for (name, stores) in &mut self.stores {
            for (id, state) in stores.iter_mut() {
                let known_before_loop = zero_runs
                    .get(name)
                    .map_or(false, |stores| stores.contains_key(id));
                if !known_before_loop {
                    *state = State::Used;
                }
            }
        }
    }

    fn absorb_pending_continues(&mut self) {
        let continues = std::mem::take(&mut self.for_loop_info.pending_continue_stores);
        for snapshot in continues {
            merge(&mut self.stores, snapshot);
        }
    }

    /// Flush a variable leaving scope: join in what every pending break and
    /// continue snapshot recorded about it, then schedule removal of each
    /// store that ended unused (or undecided, with an unused fallback) and
    /// has a movable value.
    fn finalize(&mut self, name: &Name, fallback: State) {
        let mut stores = self.stores.remove(name).unwrap_or_default();

        for snapshot in &mut self.for_loop_info.pending_break_stores {
            if let Some(other) = snapshot.remove(name) {
                join_stores(&mut stores, other);
            }
        }
        for snapshot in &mut self.for_loop_info.pending_continue_stores {
            if let Some(other) = snapshot.remove(name) {
                join_stores(&mut stores, other);
            }
        }

        for (id, state) in stores {
            let unused = state == State::Unused
                || (state == State::Undecided && fallback == State::Unused);
            if unused && self.movable_values.get(&id).copied().unwrap_or(false) {
                self.pending_removals.insert(id);
            }
        }
    }
}

/// Pointwise join of two tracked-store maps; entries present on one side
/// only are preserved.
fn merge(target: &mut TrackedStores, other: TrackedStores) {
    for (name, other_stores) in other {
        match target.entry(name) {
            Entry::Occupied(mut entry) => join_stores(entry.get_mut(), other_stores),
            Entry::Vacant(entry) => {
                entry.insert(other_stores);
            }
        }
    }
}

fn join_stores(target: &mut FxHashMap<StoreId, State>, other: FxHashMap<StoreId, State>) {
    for (id, other_state) in other {
        match target.entry(id) {
            Entry::Occupied(mut entry) => State::join(entry.get_mut(), other_state),
            Entry::Vacant(entry) => {
                entry.insert(other_state);
            }
        }
    }
}

// ============================================================================
// Removal
// ============================================================================

fn remove_stores(block: &mut Block, pending: &FxHashSet<StoreId>) {
    iterate_replacing(&mut block.statements, |statement| match statement {
        Statement::Assignment(assignment) if pending.contains(&assignment.id) => {
            tracing::trace!(variable = %assignment.targets[0].name, "dropping unused assignment");
            Some(Vec::new())
        }
        Statement::VariableDeclaration(declaration) if pending.contains(&declaration.id) => {
            tracing::trace!(variable = %declaration.variables[0].name, "dropping unused initializer");
            declaration.value = None;
            None
        }
        _ => None,
    });

    for statement in &mut block.statements {
        match statement {
            Statement::Block(inner) => remove_stores(inner, pending),
            Statement::If(if_stmt) => remove_stores(&mut if_stmt.body, pending),
            Statement::Switch(switch) => {
                for case in &mut switch.cases {
                    remove_stores(&mut case.body, pending);
                }
            }
            Statement::ForLoop(for_loop) => {
                remove_stores(&mut for_loop.pre, pending);
                remove_stores(&mut for_loop.post, pending);
                remove_stores(&mut for_loop.body, pending);
            }
            Statement::FunctionDefinition(function) => {
                remove_stores(&mut function.body, pending)
            }
            _ => {}
        }
    }
}
