use std::env;
use std::fs::File;
use std::path::Path;

use gl_generator::{Api, Fallbacks, GlobalGenerator, Profile, Registry};

fn main() {
    let dest = env::var("OUT_DIR").unwrap();
    let mut file = File::create(Path::new(&dest).join("gl_bindings.rs")).unwrap();

    let extensions = ["GL_OES_vertex_array_object", "GL_EXT_blend_func_extended"];
    Registry::new(Api::Gles2, (2, 0), Profile::Core, Fallbacks::All, extensions)
        .write_bindings(GlobalGenerator, &mut file)
        .unwrap();

    println!("cargo:rerun-if-changed=build.rs");
}
