use std::{env, path::PathBuf};

fn main() {
    println!("cargo::rustc-check-cfg=cfg(oidn_native)");
    println!("cargo:rerun-if-env-changed=OIDN_DIR");
    println!("cargo:rerun-if-env-changed=IMGDENOISE_NO_OIDN");

    if env::var("DOCS_RS").is_ok() || env::var("IMGDENOISE_NO_OIDN").is_ok() {
        return;
    }

    //
    // ---- Locate OpenImageDenoise ----
    //
    let include_paths: Vec<PathBuf> = if let Ok(dir) = env::var("OIDN_DIR") {
        let root = PathBuf::from(dir);
        println!("cargo:rustc-link-search=native={}", root.join("lib").display());
        println!("cargo:rustc-link-lib=OpenImageDenoise");
        vec![root.join("include")]
    } else {
        match pkg_config::Config::new().probe("OpenImageDenoise") {
            Ok(library) => library.include_paths,
            Err(e) => {
                println!("cargo:warning=Building without OpenImageDenoise, using the built-in CPU filter ({e})");
                return;
            }
        }
    };

    println!("cargo:rustc-cfg=oidn_native");

    //
    // ---- Generate OIDN bindings ----
    //
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    let bindings = include_paths
        .iter()
        .fold(
            bindgen::Builder::default().header_contents("oidn_wrapper.h", "#include <OpenImageDenoise/oidn.h>\n"),
            |builder, path| builder.clang_arg(format!("-I{}", path.display())),
        )
        .allowlist_function("oidn.*")
        .allowlist_type("OIDN.*")
        .allowlist_var("OIDN_.*")
        .raw_line("// Mark extern blocks as unsafe for Rust 2024")
        .generate()
        .expect("Unable to generate OIDN bindings");

    let out_path = out_dir.join("oidn_bindings.rs");
    bindings
        .write_to_file(&out_path)
        .expect("Couldn't write OIDN bindings!");

    // Read the generated file and add unsafe to extern blocks
    let contents = std::fs::read_to_string(&out_path).expect("Couldn't read OIDN bindings");
    let fixed = contents.replace("extern \"C\" {", "unsafe extern \"C\" {");
    std::fs::write(&out_path, fixed).expect("Couldn't rewrite OIDN bindings");
}
