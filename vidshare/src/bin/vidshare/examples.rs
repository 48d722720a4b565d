use crate::commands::{init, reset, seed, stats, videos};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "init",
            groups: init::EXAMPLES,
        },
        CommandExample {
            name: "seed",
            groups: seed::EXAMPLES,
        },
        CommandExample {
            name: "videos",
            groups: videos::EXAMPLES,
        },
        CommandExample {
            name: "stats",
            groups: stats::EXAMPLES,
        },
        CommandExample {
            name: "reset",
            groups: reset::EXAMPLES,
        },
    ]
}
