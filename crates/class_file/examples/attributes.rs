use std::{env, fs::File};

use classattr_class_file::{Attribute, ClassFile};
use memmap::Mmap;

fn main() {
    pretty_env_logger::init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: attributes <path/to/Some.class>");
        std::process::exit(2);
    };
    let file = File::open(&path).unwrap();
    let mmap = unsafe { Mmap::map(&file).unwrap() };

    let class_file = ClassFile::parse(&mmap).unwrap();

    println!("Class:   {}", class_file.class_name().unwrap());
    println!("Version: {}.{}", class_file.version.0, class_file.version.1);
    println!();

    let attributes = match class_file.class_attributes() {
        Ok(attributes) => attributes,
        Err(e) => {
            log::warn!("{}, retrying leniently", e);
            class_file.class_attributes_lenient().unwrap()
        }
    };

    for attribute in &attributes {
        match attribute {
            Attribute::ModuleTarget(module_target) => match module_target.target_platform() {
                Ok(platform) => println!("    ModuleTarget  {}", platform),
                Err(e) => println!("    ModuleTarget  <{}>", e),
            },
            Attribute::SourceFile(source_file) => match source_file.source_file() {
                Ok(source_file) => println!("    SourceFile    {}", source_file),
                Err(e) => println!("    SourceFile    <{}>", e),
            },
            Attribute::Unknown(unknown) => {
                println!("    {:<13} ({} bytes)", unknown.name(), unknown.contents().len())
            }
        }
    }
}
