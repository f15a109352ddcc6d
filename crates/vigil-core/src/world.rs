use serde::Serialize;

/// One game server. Territory keys are scoped per world.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct World {
    pub name: &'static str,
    pub badge: &'static str,
}

pub const WORLDS: &[World] = &[
    World { name: "blue", badge: "🔵" },
    World { name: "coral", badge: "🔴" },
    World { name: "orange", badge: "🟠" },
    World { name: "red", badge: "🔴" },
    World { name: "yellow", badge: "🟡" },
    World { name: "mocha", badge: "🟤" },
    World { name: "white", badge: "⚪" },
    World { name: "jade", badge: "🟢" },
    World { name: "black", badge: "⚫" },
    World { name: "cyan", badge: "🔵" },
    World { name: "lime", badge: "🟢" },
];

pub fn lookup(name: &str) -> Option<&'static World> {
    let normalized = name.trim().to_ascii_lowercase();
    WORLDS.iter().find(|world| world.name == normalized)
}

pub fn is_known(name: &str) -> bool {
    lookup(name).is_some()
}

pub fn names() -> impl Iterator<Item = &'static str> {
    WORLDS.iter().map(|world| world.name)
}
