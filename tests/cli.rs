//! CLI tests for tongs.
//!
//! The build tests never touch a real Conan installation: either they run
//! in dry-run mode or they point `--tool` at a stub script.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn tongs() -> Command {
    let mut cmd = cargo_bin_cmd!("tongs");
    cmd.env("NO_COLOR", "1").env_remove("TONGS_CONAN").env_remove("RUST_LOG");
    cmd
}

/// Recipe root with `a` and `c` holding a conanfile and `b` without one.
fn recipe_root() -> TempDir {
    let temp = TempDir::new().unwrap();
    for name in ["a", "c"] {
        let dir = temp.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("conanfile.py"), "from conan import ConanFile\n").unwrap();
    }
    fs::create_dir_all(temp.path().join("b")).unwrap();
    temp
}

/// Fake `conan` that fails with exit code 2 for the recipe named `c`.
#[cfg(unix)]
fn stub_conan(dir: &Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-conan");
    fs::write(
        &path,
        "#!/bin/sh\n\
         echo \"$@\" >> \"$(dirname \"$0\")/calls.log\"\n\
         case \"$2\" in\n\
           */c) echo 'ERROR: c is broken' >&2; exit 2 ;;\n\
         esac\n\
         exit 0\n",
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Executable shell script at `dir/name`.
#[cfg(unix)]
fn script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
    tongs()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
    tongs()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tongs"));
}

#[test]
fn subcommand_help_works() {
    for cmd in ["build", "list", "merge", "env"] {
        tongs()
            .args([cmd, "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage"));
    }
}

// =============================================================================
// build
// =============================================================================

#[test]
fn dry_run_lists_commands_without_running() {
    let root = recipe_root();

    tongs()
        .args(["build", "--dry-run", "-b", "Release", "--tool", "/nonexistent/conan", "-d"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Encontrada(s) 2 receita(s)"))
        .stdout(predicate::str::contains("-s build_type=Release --build=missing"))
        .stdout(predicate::str::contains("Total: 2"))
        .stdout(predicate::str::contains("Falha: 0"))
        .stdout(predicate::str::contains("  - b").not());
}

#[test]
fn missing_recipe_dir_is_reported_but_not_fatal() {
    let temp = TempDir::new().unwrap();

    tongs()
        .args(["build", "-d"])
        .arg(temp.path().join("conan_recipe"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Directory does not exist"));
}

#[test]
fn empty_recipe_dir_is_a_no_op() {
    let temp = TempDir::new().unwrap();

    tongs()
        .args(["build", "--tool", "/nonexistent/conan", "-d"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nenhuma receita encontrada"));
}

#[test]
fn launch_failure_fails_the_run() {
    let root = recipe_root();

    tongs()
        .args(["build", "--tool", "/nonexistent/conan", "-d"])
        .arg(root.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Falha: 2"));
}

#[cfg(unix)]
#[test]
fn one_failing_recipe_gives_exit_code_one() {
    let root = recipe_root();
    let bin = TempDir::new().unwrap();
    let conan = stub_conan(bin.path());

    tongs()
        .args(["build", "-d"])
        .arg(root.path())
        .arg("--tool")
        .arg(&conan)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Construída: a"))
        .stdout(predicate::str::contains("Total: 2"))
        .stdout(predicate::str::contains("Sucesso: 1"))
        .stdout(predicate::str::contains("Falha: 1"))
        .stderr(predicate::str::contains("código de saída: 2"))
        .stderr(predicate::str::contains("ERROR: c is broken"));

    let canonical = fs::canonicalize(root.path()).unwrap();
    let calls = fs::read_to_string(bin.path().join("calls.log")).unwrap();
    let lines: Vec<&str> = calls.lines().collect();
    assert_eq!(
        lines,
        [
            format!("create {} -s build_type=Debug --build=missing", canonical.join("a").display()),
            format!("create {} -s build_type=Debug --build=missing", canonical.join("c").display()),
        ]
    );
}

#[cfg(unix)]
#[test]
fn fail_fast_from_config_file() {
    let temp = TempDir::new().unwrap();
    for name in ["a", "c", "d"] {
        let dir = temp.path().join("recipes").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("conanfile.py"), "").unwrap();
    }
    let conan = stub_conan(temp.path());
    fs::write(
        temp.path().join("tongs.toml"),
        format!(
            "[build]\nrecipe_dir = \"recipes\"\nbuild_type = \"MinSizeRel\"\nfail_fast = true\ntool = \"{}\"\n",
            conan.display()
        ),
    )
    .unwrap();

    tongs()
        .current_dir(temp.path())
        .arg("build")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Ignorada (fail-fast): d"))
        .stdout(predicate::str::contains("Ignoradas: 1"));

    let calls = fs::read_to_string(temp.path().join("calls.log")).unwrap();
    assert_eq!(calls.lines().count(), 2);
    assert!(calls.contains("build_type=MinSizeRel"));
}

#[test]
fn invalid_config_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("tongs.toml"), "[build]\nbuild_type = \"Fast\"\n").unwrap();

    tongs()
        .current_dir(temp.path())
        .args(["build", "--dry-run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}

// =============================================================================
// list
// =============================================================================

#[test]
fn list_shows_recipes() {
    let root = recipe_root();

    tongs()
        .args(["--quiet", "list", "-d"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("a -"))
        .stdout(predicate::str::contains("c -"))
        .stdout(predicate::str::contains("b -").not());
}

#[test]
fn list_missing_dir_fails() {
    let temp = TempDir::new().unwrap();

    tongs()
        .args(["list", "-d"])
        .arg(temp.path().join("missing"))
        .assert()
        .code(1);
}

// =============================================================================
// merge
// =============================================================================

#[test]
fn merge_writes_default_output() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("core")).unwrap();
    fs::write(temp.path().join("core/device.hpp"), "struct Device;").unwrap();
    fs::write(temp.path().join("main.cpp"), "int main() {}\n").unwrap();
    fs::write(temp.path().join("notes.md"), "skip me").unwrap();

    tongs()
        .arg("merge")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Encontrados 2 arquivo(s)"));

    let dump = fs::read_to_string(temp.path().join("merged_sources.txt")).unwrap();
    assert!(dump.contains("# Total de arquivos: 2"));
    assert!(dump.contains("struct Device;\n"));
    assert!(!dump.contains("skip me"));
    assert!(dump.find("core").unwrap() < dump.find("main.cpp").unwrap());
}

#[test]
fn merge_custom_output_and_extensions() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.h"), "#pragma once\n").unwrap();
    fs::write(temp.path().join("b.cpp"), "void b();\n").unwrap();

    tongs()
        .arg("merge")
        .arg(temp.path())
        .args(["-o", "review.txt", "-e", "h"])
        .assert()
        .success();

    let dump = fs::read_to_string(temp.path().join("review.txt")).unwrap();
    assert!(dump.contains("#pragma once"));
    assert!(!dump.contains("void b();"));
}

#[test]
fn merge_without_matches_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("readme.md"), "").unwrap();

    tongs()
        .arg("merge")
        .arg(temp.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Nenhum arquivo encontrado"));
}

#[test]
fn merge_missing_directory_fails() {
    let temp = TempDir::new().unwrap();

    tongs()
        .arg("merge")
        .arg(temp.path().join("src"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Directory does not exist"));
}

#[cfg(unix)]
#[test]
fn interrupted_tool_stops_with_exit_130() {
    let root = recipe_root();
    let bin = TempDir::new().unwrap();
    let conan = script(
        bin.path(),
        "fake-conan",
        "echo \"$@\" >> \"$(dirname \"$0\")/calls.log\"\nkill -INT $$\n",
    );

    tongs()
        .args(["build", "--tool"])
        .arg(&conan)
        .arg("-d")
        .arg(root.path())
        .assert()
        .code(130)
        .stdout(predicate::str::contains("Total:").not())
        .stderr(predicate::str::contains("Interrompido pelo usuário"));

    let calls = fs::read_to_string(bin.path().join("calls.log")).unwrap();
    assert_eq!(calls.lines().count(), 1);
}

#[test]
fn recipe_dir_is_normalized() {
    let root = recipe_root();
    let canonical = fs::canonicalize(root.path()).unwrap();

    tongs()
        .args(["build", "--dry-run", "-d"])
        .arg(root.path().join("a").join(".."))
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "create {} -s",
            canonical.join("a").display()
        )))
        .stdout(predicate::str::contains("/../").not());
}

// =============================================================================
// env
// =============================================================================

#[cfg(unix)]
#[test]
fn env_shows_tool_version_and_recipes() {
    let root = recipe_root();
    let bin = TempDir::new().unwrap();
    let conan = script(bin.path(), "fake-conan", "echo 'Conan version 2.3.0'\n");

    tongs()
        .current_dir(root.path())
        .args(["env", "--tool"])
        .arg(&conan)
        .assert()
        .success()
        .stdout(predicate::str::contains("Conan version 2.3.0"))
        .stdout(predicate::str::contains("padrão (sem tongs.toml)"))
        .stdout(predicate::str::contains("2 receita(s) encontrada(s)"));
}

#[test]
fn env_warns_when_tool_is_missing() {
    let temp = TempDir::new().unwrap();

    tongs()
        .current_dir(temp.path())
        .args(["env", "--tool", "/nonexistent/conan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("'/nonexistent/conan' não disponível"));
}
