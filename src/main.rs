use classtree::analyze::{self, ClassAnalyzer};
use classtree::class_file;
use classtree::jvm::{self, Name, TypeRef, TypeRegistry};

use clap::{crate_version, Arg, ArgAction, Command};
use std::fs;

fn main() -> Result<(), analyze::Error> {
    env_logger::init();

    let matches = Command::new("Class file structure recovery")
        .version(crate_version!())
        .about("Decode JVM class files and print the declarations recovered from them")
        .arg(
            Arg::new("interface")
                .long("interface")
                .value_name("INTERNAL_NAME")
                .action(ArgAction::Append)
                .help("Register a class as an interface (eg. `com/example/Visitor`)"),
        )
        .arg(
            Arg::new("skip-bodies")
                .long("skip-bodies")
                .action(ArgAction::SetTrue)
                .help("Only recover declarations, without replaying method bodies"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Class files to analyze")
                .required(true)
                .num_args(1..)
                .index(1),
        )
        .get_matches();

    let registry = TypeRegistry::with_java_library();
    for interface in matches.get_many::<String>("interface").into_iter().flatten() {
        let name = jvm::BinaryName::from_string(interface.clone())
            .map_err(jvm::Error::MalformedName)?;
        log::info!("Registering interface '{}'", name.as_str());
        registry.register(TypeRef::interface(name));
    }

    let mut analyzer = ClassAnalyzer::new(&registry);
    if matches.get_flag("skip-bodies") {
        analyzer = analyzer.skip_bodies();
    }

    for input in matches.get_many::<String>("INPUT").into_iter().flatten() {
        log::info!("Reading '{}'", input);
        let bytes = fs::read(input).map_err(jvm::Error::IoError)?;
        let class = class_file::read_class(&bytes)?;
        let declaration = analyzer.analyze(&class)?;
        println!("{:#?}", declaration);
    }

    Ok(())
}
