use atomic_config::AtomicConfig;
use atomic_saga::resolve_mode;

pub(crate) fn run(config: &AtomicConfig) {
    if config.transactions().is_empty() {
        println!("No transactions defined in {}.", config.path().display());
        return;
    }

    for (name, definition) in config.transactions() {
        println!("{name}");
        for step in definition.steps() {
            let execute = step.execute();
            let rollback = step.rollback();
            println!(
                "  {} ({}) {} {} | rollback {} {} | transform {}",
                step.key(),
                resolve_mode(step),
                execute.method(),
                execute.url(),
                rollback.method(),
                rollback.url(),
                step.transform(),
            );
        }
    }
}
