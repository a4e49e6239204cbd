//! Build script for plainmpi
//!
//! Locates an MPI installation, compiles the byte-level C shim in `csrc/`
//! against its headers, and links the MPI library.
//!
//! Lookup order:
//! 1. `MPI_PKG_CONFIG` (an explicit pkg-config package name)
//! 2. pkg-config packages `mpich`, `ompi`, `mpi`
//! 3. the compiler wrapper named by `MPICC` (default `mpicc`) queried with `-show`
//! 4. `CRAY_MPICH_DIR`
//! 5. well-known installation prefixes

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const SHIM_SOURCE: &str = "csrc/plainmpi.c";
const SHIM_HEADER: &str = "csrc/plainmpi.h";

fn main() {
    println!("cargo:rerun-if-changed={SHIM_SOURCE}");
    println!("cargo:rerun-if-changed={SHIM_HEADER}");
    for var in ["MPI_PKG_CONFIG", "MPICC", "CRAY_MPICH_DIR"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    let mpi = locate_mpi().unwrap_or_else(|| {
        panic!(
            "Could not find an MPI installation. Install MPICH or Open MPI and either:\n\
             - set MPI_PKG_CONFIG to its pkg-config name (e.g. 'mpich' or 'ompi')\n\
             - put 'mpicc' on PATH, or point MPICC at the wrapper\n\
             - set CRAY_MPICH_DIR on Cray systems"
        )
    });

    let mut build = cc::Build::new();
    build
        .file(SHIM_SOURCE)
        .include("csrc")
        .warnings(true)
        .extra_warnings(true);
    for path in &mpi.include_paths {
        build.include(path);
    }
    if env::var("PROFILE").as_deref() == Ok("release") {
        build.opt_level(3);
    }
    build.compile("plainmpi_shim");

    for path in &mpi.link_paths {
        println!("cargo:rustc-link-search=native={}", path.display());
        // Resolve the same libmpi at runtime that we linked against.
        println!("cargo:rustc-link-arg=-Wl,-rpath,{}", path.display());
    }
    for lib in &mpi.libs {
        println!("cargo:rustc-link-lib={lib}");
    }
    if let Some(version) = mpi.version {
        println!("cargo:rustc-env=PLAINMPI_MPI_VERSION={version}");
    }
}

struct MpiInstall {
    include_paths: Vec<PathBuf>,
    link_paths: Vec<PathBuf>,
    libs: Vec<String>,
    version: Option<String>,
}

impl MpiInstall {
    fn at_prefix(prefix: &Path) -> Self {
        MpiInstall {
            include_paths: vec![prefix.join("include")],
            link_paths: vec![prefix.join("lib")],
            libs: vec!["mpi".to_string()],
            version: None,
        }
    }
}

fn locate_mpi() -> Option<MpiInstall> {
    if let Ok(name) = env::var("MPI_PKG_CONFIG") {
        if let Some(found) = from_pkg_config(&name) {
            eprintln!("plainmpi: MPI from MPI_PKG_CONFIG={name}");
            return Some(found);
        }
    }

    for name in ["mpich", "ompi", "mpi"] {
        if let Some(found) = from_pkg_config(name) {
            eprintln!("plainmpi: MPI from pkg-config package {name}");
            return Some(found);
        }
    }

    let wrapper = env::var("MPICC").unwrap_or_else(|_| "mpicc".to_string());
    match from_compiler_wrapper(&wrapper) {
        Ok(found) => {
            eprintln!("plainmpi: MPI from '{wrapper} -show'");
            return Some(found);
        }
        Err(e) => eprintln!("plainmpi: {e}"),
    }

    if let Ok(dir) = env::var("CRAY_MPICH_DIR") {
        eprintln!("plainmpi: Cray MPICH at {dir}");
        return Some(MpiInstall::at_prefix(Path::new(&dir)));
    }

    ["/usr", "/usr/local", "/opt/mpich", "/opt/openmpi"]
        .iter()
        .map(Path::new)
        .find(|prefix| prefix.join("include").join("mpi.h").exists())
        .map(|prefix| {
            eprintln!("plainmpi: MPI headers under {}", prefix.display());
            MpiInstall::at_prefix(prefix)
        })
}

fn from_pkg_config(name: &str) -> Option<MpiInstall> {
    let lib = pkg_config::Config::new()
        .cargo_metadata(false)
        .probe(name)
        .ok()?;
    Some(MpiInstall {
        include_paths: lib.include_paths,
        link_paths: lib.link_paths,
        libs: lib.libs,
        version: Some(lib.version),
    })
}

fn from_compiler_wrapper(wrapper: &str) -> Result<MpiInstall, String> {
    let output = Command::new(wrapper)
        .arg("-show")
        .output()
        .map_err(|e| format!("failed to run '{wrapper}': {e}"))?;
    if !output.status.success() {
        return Err(format!("'{wrapper} -show' exited with {}", output.status));
    }
    Ok(parse_show_flags(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_show_flags(flags: &str) -> MpiInstall {
    let mut found = MpiInstall {
        include_paths: Vec::new(),
        link_paths: Vec::new(),
        libs: Vec::new(),
        version: None,
    };

    for token in flags.split_whitespace() {
        if let Some(path) = token.strip_prefix("-I") {
            found.include_paths.push(PathBuf::from(path));
        } else if let Some(path) = token.strip_prefix("-L") {
            found.link_paths.push(PathBuf::from(path));
        } else if let Some(lib) = token.strip_prefix("-l") {
            found.libs.push(lib.to_string());
        }
    }

    if found.libs.is_empty() {
        found.libs.push("mpi".to_string());
    }
    found
}
