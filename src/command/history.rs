use log::debug;

use super::EditCommand;
use crate::annotation::AnnotationSet;

/// A named group of commands undone and redone as one atomic unit.
#[derive(Clone, Debug)]
pub struct Transaction {
    name: String,
    commands: Vec<EditCommand>,
}

impl Transaction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[EditCommand] {
        &self.commands
    }
}

/// Undo/redo stacks with macro grouping.
///
/// `push` applies the command immediately. Between `begin_macro` and
/// `end_macro` pushed commands accumulate into one transaction; outside a
/// macro each command is its own transaction named after the command.
#[derive(Default)]
pub struct CommandHistory {
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    open: Option<Transaction>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_macro(&mut self, name: &str) {
        assert!(self.open.is_none(), "nested undo macros are not supported");
        self.open = Some(Transaction {
            name: name.to_owned(),
            commands: Vec::new(),
        });
    }

    pub fn end_macro(&mut self) {
        let open = self.open.take().expect("end_macro without begin_macro");
        if open.commands.is_empty() {
            // Nothing happened; an empty undo entry would be confusing.
            return;
        }
        debug!("commit macro '{}' ({} commands)", open.name, open.commands.len());
        self.undo_stack.push(open);
        self.redo_stack.clear();
    }

    /// Apply a command and record it.
    pub fn push(&mut self, command: EditCommand, set: &mut AnnotationSet) {
        command.apply(set);
        if let Some(open) = &mut self.open {
            open.commands.push(command);
        } else {
            let name = command.name().to_owned();
            self.undo_stack.push(Transaction {
                name,
                commands: vec![command],
            });
            self.redo_stack.clear();
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_name(&self) -> Option<&str> {
        self.undo_stack.last().map(|t| t.name())
    }

    pub fn redo_name(&self) -> Option<&str> {
        self.redo_stack.last().map(|t| t.name())
    }

    pub fn undo(&mut self, set: &mut AnnotationSet) -> bool {
        assert!(self.open.is_none(), "undo during an open macro");
        let Some(transaction) = self.undo_stack.pop() else {
            return false;
        };
        debug!("undo '{}'", transaction.name());
        for command in transaction.commands.iter().rev() {
            command.revert(set);
        }
        self.redo_stack.push(transaction);
        true
    }

    pub fn redo(&mut self, set: &mut AnnotationSet) -> bool {
        assert!(self.open.is_none(), "redo during an open macro");
        let Some(transaction) = self.redo_stack.pop() else {
            return false;
        };
        debug!("redo '{}'", transaction.name());
        for command in &transaction.commands {
            command.apply(set);
        }
        self.undo_stack.push(transaction);
        true
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open = None;
    }
}
