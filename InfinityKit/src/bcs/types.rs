//! Compiled script records

/// Region value meaning "no region"
pub const NO_REGION: [i32; 4] = [-1, -1, -1, -1];

/// Target description of a trigger or action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub ea: i32,
    /// Planescape: Torment only
    pub faction: i32,
    /// Planescape: Torment only
    pub team: i32,
    pub general: i32,
    pub race: i32,
    pub class: i32,
    pub specific: i32,
    pub gender: i32,
    pub alignment: i32,
    /// OBJECT.IDS function identifiers; index 0 is the outermost call
    pub identifiers: [i32; 5],
    pub region: [i32; 4],
    /// Literal script name (door tags, creature death variables)
    pub name: String,
}

impl Default for Object {
    fn default() -> Self {
        Self {
            ea: 0,
            faction: 0,
            team: 0,
            general: 0,
            race: 0,
            class: 0,
            specific: 0,
            gender: 0,
            alignment: 0,
            identifiers: [0; 5],
            region: NO_REGION,
            name: String::new(),
        }
    }
}

impl Object {
    /// True when the object selects nothing in particular (`[ANYONE]`)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.identifiers.iter().all(|&i| i == 0) && self.target_fields_empty()
    }

    /// True when every classification field is zero
    #[must_use]
    pub fn target_fields_empty(&self) -> bool {
        [
            self.ea,
            self.faction,
            self.team,
            self.general,
            self.race,
            self.class,
            self.specific,
            self.gender,
            self.alignment,
        ]
        .iter()
        .all(|&v| v == 0)
    }

    /// Object referencing one OBJECT.IDS identifier (`Myself`, `Player1`)
    #[must_use]
    pub fn identifier(id: i32) -> Self {
        let mut object = Self::default();
        object.identifiers[0] = id;
        object
    }

    /// Object selecting a literal script name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A condition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trigger {
    pub opcode: u32,
    pub int1: i32,
    /// Bit 0 negates the trigger
    pub flags: u32,
    pub int2: i32,
    pub int3: i32,
    pub str1: String,
    pub str2: String,
    pub object: Object,
}

impl Trigger {
    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.flags & 1 != 0
    }

    pub fn set_negated(&mut self, negated: bool) {
        if negated {
            self.flags |= 1;
        } else {
            self.flags &= !1;
        }
    }
}

/// One engine action call as stored in a compiled script
///
/// `objects` are the call's own object slots 1 and 2; slot 0 of the
/// compiled record belongs to [`Action::Override`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionCall {
    pub opcode: u32,
    pub objects: [Object; 2],
    pub int1: i32,
    pub point: (i32, i32),
    pub int2: i32,
    pub int3: i32,
    pub str1: String,
    pub str2: String,
}

/// An action, optionally forced onto another actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Plain(ActionCall),
    /// `ActionOverride(target, inner)`
    Override { target: Object, inner: Box<Action> },
}

impl Default for Action {
    fn default() -> Self {
        Action::Plain(ActionCall::default())
    }
}

impl Action {
    /// The innermost engine call
    #[must_use]
    pub fn call(&self) -> &ActionCall {
        match self {
            Action::Plain(call) => call,
            Action::Override { inner, .. } => inner.call(),
        }
    }

    pub fn call_mut(&mut self) -> &mut ActionCall {
        match self {
            Action::Plain(call) => call,
            Action::Override { inner, .. } => inner.call_mut(),
        }
    }

    /// The override target as stored in object slot 0 (empty for plain actions)
    #[must_use]
    pub fn override_target(&self) -> Option<&Object> {
        match self {
            Action::Plain(_) => None,
            Action::Override { target, .. } => Some(target),
        }
    }

    /// Split a compiled record into the variant form
    #[must_use]
    pub fn from_slots(target: Object, call: ActionCall) -> Self {
        if target.is_empty() {
            Action::Plain(call)
        } else {
            Action::Override {
                target,
                inner: Box::new(Action::Plain(call)),
            }
        }
    }
}

/// A weighted list of actions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    pub weight: i32,
    pub actions: Vec<Action>,
}

/// `IF triggers THEN responses END`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub triggers: Vec<Trigger>,
    pub responses: Vec<Response>,
}

/// A compiled script
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    pub blocks: Vec<Block>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_split() {
        let call = ActionCall {
            opcode: 3,
            ..ActionCall::default()
        };
        assert_eq!(Action::from_slots(Object::default(), call.clone()), Action::Plain(call.clone()));

        let action = Action::from_slots(Object::named("Imoen"), call.clone());
        assert_eq!(action.call(), &call);
        assert_eq!(action.override_target(), Some(&Object::named("Imoen")));
    }

    #[test]
    fn test_negation_flag() {
        let mut trigger = Trigger::default();
        trigger.set_negated(true);
        assert!(trigger.is_negated());
        trigger.set_negated(false);
        assert_eq!(trigger.flags, 0);
    }
}
