//! Per-executor variable store.
//!
//! Variables are how commands share state across statements and tasks: the
//! `alias_def` preprocessor stores [`Alias`] entries that a later `alias`
//! pass reads back, and [`AUTO_PREPROCESSOR_VAR`] lists preprocessors that
//! run on every task. A variable outlives the task that created it.

/// Reserved variable listing automatic preprocessors, one keyword per value.
pub const AUTO_PREPROCESSOR_VAR: &str = "auto_preprocessor";

/// A textual macro substituted into scripts by the `alias` preprocessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub id: String,
    pub replacement: String,
}

impl Alias {
    pub fn new(id: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            replacement: replacement.into(),
        }
    }
}

/// One entry of a variable.
///
/// Consumers match on the variant they expect and skip the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Alias(Alias),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_alias(&self) -> Option<&Alias> {
        match self {
            Value::Alias(alias) => Some(alias),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Alias> for Value {
    fn from(alias: Alias) -> Self {
        Value::Alias(alias)
    }
}

/// A named, ordered, duplicate-free list of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    id: String,
    values: Vec<Value>,
}

impl Variable {
    pub fn new(id: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Replace the first entry matching `pred` with `value`, in place.
    ///
    /// Returns false and leaves the entries untouched when nothing matches
    /// or when `value` is already present.
    pub fn replace_where(
        &mut self,
        mut pred: impl FnMut(&Value) -> bool,
        value: impl Into<Value>,
    ) -> bool {
        let value = value.into();
        if self.values.contains(&value) {
            return false;
        }
        match self.values.iter_mut().find(|v| pred(v)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Reorder the entries by `key`. The sort is stable.
    pub fn sort_by_key<K: Ord>(&mut self, key: impl FnMut(&Value) -> K) {
        self.values.sort_by_key(key);
    }

    /// Append `value` unless an equal entry is already present.
    ///
    /// Returns whether the value was added.
    pub fn append_unique(&mut self, value: impl Into<Value>) -> bool {
        let value = value.into();
        if self.values.contains(&value) {
            return false;
        }
        self.values.push(value);
        true
    }

    /// Iterate over the text entries only.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter_map(Value::as_text)
    }

    /// Iterate over the alias entries only.
    pub fn aliases(&self) -> impl Iterator<Item = &Alias> {
        self.values.iter().filter_map(Value::as_alias)
    }
}

/// Variable store keyed by id. Ids are unique within a store.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    vars: Vec<Variable>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create variable `id` holding `values`.
    ///
    /// Does nothing if `id` already exists; an existing variable is never
    /// overwritten. Returns whether a variable was created.
    pub fn init(&mut self, id: impl Into<String>, values: Vec<Value>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.vars.push(Variable::new(id, values));
        true
    }

    pub fn get(&self, id: &str) -> Option<&Variable> {
        self.vars.iter().find(|v| v.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Variable> {
        self.vars.iter_mut().find(|v| v.id == id)
    }

    /// Return variable `id`, creating it empty first if needed.
    pub fn get_or_create(&mut self, id: &str) -> &mut Variable {
        let index = match self.vars.iter().position(|v| v.id == id) {
            Some(index) => index,
            None => {
                self.vars.push(Variable::new(id, Vec::new()));
                self.vars.len() - 1
            }
        };
        &mut self.vars[index]
    }

    /// Append `value` to variable `id` (created on demand) unless present.
    pub fn append_unique(&mut self, id: &str, value: impl Into<Value>) -> bool {
        self.get_or_create(id).append_unique(value)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
