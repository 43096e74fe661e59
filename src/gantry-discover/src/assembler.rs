//! Model assembly: turns one directory's candidates into a [`PackageModel`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{DiscoverError, DiscoverResult};
use crate::kebab::to_kebab_case;
use crate::model::{CommandInfo, CommandKind, FileInfo, PackageModel};
use crate::scanner::{CommandCandidate, PackageScan};

/// Suffix that marks a type as the wrapper object of a same-named function.
pub const WRAPPER_SUFFIX: &str = "Command";

impl PackageScan {
    /// Validate the accumulated candidates and build the package model.
    pub fn finish(self) -> DiscoverResult<PackageModel> {
        let PackageScan {
            dir,
            package_name,
            doc,
            candidates,
            links,
            run_methods,
            mut descriptions,
            mut entry_points,
        } = self;

        if !entry_points.is_empty() {
            entry_points.sort();
            entry_points.dedup();
            return Err(DiscoverError::EntryPoint {
                files: entry_points,
            });
        }

        let package_name = package_name.unwrap_or_default();
        let linked_types: BTreeSet<&str> = links.iter().map(|l| l.child_type.as_str()).collect();
        let linked_names: BTreeSet<&str> = links.iter().map(|l| l.name.as_str()).collect();

        let mut types: BTreeMap<String, CommandInfo> = BTreeMap::new();
        let mut functions: BTreeMap<String, CommandInfo> = BTreeMap::new();

        for candidate in candidates {
            match candidate {
                CommandCandidate::Type {
                    name,
                    file,
                    has_subcommand_fields,
                } => {
                    if linked_types.contains(name.as_str()) {
                        debug!("Type {} is a subcommand, not promoted", name);
                        continue;
                    }
                    let run = run_methods.get(&name);
                    if run.is_none() && !has_subcommand_fields {
                        continue;
                    }
                    let description = descriptions.remove(&name).unwrap_or_default();
                    types.insert(
                        name.clone(),
                        CommandInfo {
                            name,
                            kind: CommandKind::Type,
                            file,
                            description,
                            uses_context: run.is_some_and(|r| r.uses_context),
                            returns_error: run.is_some_and(|r| r.returns_error),
                        },
                    );
                }
                CommandCandidate::Function {
                    name,
                    file,
                    description,
                    uses_context,
                    returns_error,
                } => {
                    if linked_names.contains(to_kebab_case(&name).as_str()) {
                        debug!("Function {} is claimed by a subcommand field", name);
                        continue;
                    }
                    functions.insert(
                        name.clone(),
                        CommandInfo {
                            name,
                            kind: CommandKind::Function,
                            file,
                            description,
                            uses_context,
                            returns_error,
                        },
                    );
                }
            }
        }

        if !types.is_empty() && !functions.is_empty() {
            let wrapped: BTreeSet<&str> = types
                .keys()
                .filter_map(|t| t.strip_suffix(WRAPPER_SUFFIX))
                .collect();
            functions.retain(|name, _| {
                let keep = !wrapped.contains(name.as_str());
                if !keep {
                    debug!("Function {} already has a wrapper type", name);
                }
                keep
            });
        }

        check_collisions(types.keys(), functions.keys())?;

        let mut commands: Vec<CommandInfo> =
            types.into_values().chain(functions.into_values()).collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        let files = index_by_file(&commands);

        info!(
            "Package {} in {:?}: {} commands",
            package_name,
            dir,
            commands.len()
        );

        Ok(PackageModel {
            dir,
            package_name,
            doc,
            commands,
            files,
        })
    }
}

/// Fail when two identifiers normalize to the same kebab-case name.
fn check_collisions<'a>(
    types: impl Iterator<Item = &'a String>,
    functions: impl Iterator<Item = &'a String>,
) -> DiscoverResult<()> {
    let mut claimed: HashMap<String, &str> = HashMap::new();

    for ident in types.chain(functions) {
        let key = to_kebab_case(ident);
        match claimed.get(&key) {
            Some(existing) if *existing != ident.as_str() => {
                return Err(DiscoverError::DuplicateCommand {
                    name: key,
                    first: (*existing).to_string(),
                    second: ident.clone(),
                });
            }
            Some(_) => {}
            None => {
                claimed.insert(key, ident.as_str());
            }
        }
    }

    Ok(())
}

/// Group sorted commands by file; files come out sorted by path.
fn index_by_file(commands: &[CommandInfo]) -> Vec<FileInfo> {
    let mut grouped: BTreeMap<&Path, Vec<CommandInfo>> = BTreeMap::new();
    for command in commands {
        grouped
            .entry(command.file.as_path())
            .or_default()
            .push(command.clone());
    }

    grouped
        .into_iter()
        .map(|(path, commands)| FileInfo {
            path: path.to_path_buf(),
            base_name: base_name(path),
            commands,
        })
        .collect()
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::TaggedFile;
    use std::path::PathBuf;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn finish(files: &[(&str, &str)]) -> DiscoverResult<PackageModel> {
        let mut scan = PackageScan::new("ops");
        for (path, body) in files {
            scan.scan_file(&TaggedFile {
                path: PathBuf::from(path),
                content: format!("//go:build gantry\n\npackage ops\n\n{body}"),
            })?;
        }
        scan.finish()
    }

    fn names(model: &PackageModel) -> Vec<&str> {
        model.commands.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_entry_points_sorted() {
        let err = finish(&[
            ("ops/z.go", "func main() {}\n"),
            ("ops/a.go", "func main() {}\n"),
        ])
        .unwrap_err();
        assert_matches!(
            err,
            DiscoverError::EntryPoint { ref files }
                if files == &vec![PathBuf::from("ops/a.go"), PathBuf::from("ops/z.go")]
        );
    }

    #[test]
    fn test_type_needs_run_or_subcommands() {
        let model = finish(&[(
            "ops/a.go",
            "type Plain struct{}\n\n\
             type Runner struct{}\n\n\
             func (Runner) Run() {}\n",
        )])
        .unwrap();
        assert_eq!(names(&model), vec!["Runner"]);
        assert_eq!(model.commands[0].kind, CommandKind::Type);
    }

    #[test]
    fn test_linked_type_never_promoted() {
        let model = finish(&[(
            "ops/a.go",
            "type Foo struct {\n\tBar Bar `gantry:\"subcommand\"`\n}\n\n\
             type Bar struct{}\n\n\
             func (Bar) Run() {}\n",
        )])
        .unwrap();
        assert_eq!(names(&model), vec!["Foo"]);
    }

    #[test]
    fn test_function_claimed_by_link_name() {
        let model = finish(&[(
            "ops/a.go",
            "type Root struct {\n\tX Child `gantry:\"subcommand,name=lint-all\"`\n}\n\n\
             type Child struct{}\n\n\
             func LintAll() {}\n\n\
             func Build() {}\n",
        )])
        .unwrap();
        assert_eq!(names(&model), vec!["Build", "Root"]);
    }

    #[test]
    fn test_wrapper_elision() {
        let model = finish(&[(
            "ops/a.go",
            "type BuildCommand struct{}\n\n\
             func (BuildCommand) Run() {}\n\n\
             func Build() {}\n\n\
             func Test() {}\n",
        )])
        .unwrap();
        assert_eq!(names(&model), vec!["BuildCommand", "Test"]);
    }

    #[test]
    fn test_duplicate_kebab_names() {
        let err = finish(&[
            ("ops/a.go", "func APIServer() {}\n"),
            ("ops/b.go", "func ApiServer() {}\n"),
        ])
        .unwrap_err();
        assert_matches!(
            err,
            DiscoverError::DuplicateCommand { ref name, ref first, ref second }
                if name == "api-server" && first == "APIServer" && second == "ApiServer"
        );

        let err = finish(&[(
            "ops/a.go",
            "type DeployApp struct{}\n\nfunc (DeployApp) Run() {}\n\nfunc DeployAPP() {}\n",
        )])
        .unwrap_err();
        assert!(err.to_string().contains("DeployApp"));
    }

    #[test]
    fn test_projection_and_file_index() {
        let model = finish(&[
            (
                "ops/b.go",
                "import \"context\"\n\n\
                 type Deploy struct{}\n\n\
                 func (*Deploy) Run(ctx context.Context) error { return nil }\n\n\
                 func (Deploy) Description() string { return \"Ship it.\" }\n",
            ),
            (
                "ops/a.go",
                "// Test runs tests.\nfunc Test() error { return nil }\n\nfunc Build() {}\n",
            ),
        ])
        .unwrap();

        assert_eq!(model.package_name, "ops");
        assert_eq!(names(&model), vec!["Build", "Deploy", "Test"]);

        let deploy = model.command("Deploy").unwrap();
        assert_eq!(deploy.description, "Ship it.");
        assert!(deploy.uses_context && deploy.returns_error);

        let test = model.command("Test").unwrap();
        assert_eq!(test.description, "Test runs tests.");
        assert!(!test.uses_context && test.returns_error);

        let index: Vec<(&str, Vec<&str>)> = model
            .files
            .iter()
            .map(|f| {
                (
                    f.base_name.as_str(),
                    f.commands.iter().map(|c| c.name.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            index,
            vec![("a.go", vec!["Build", "Test"]), ("b.go", vec!["Deploy"])]
        );
    }

    #[test]
    fn test_files_without_commands_not_indexed() {
        let model = finish(&[
            ("ops/a.go", "func Build() {}\n"),
            ("ops/helpers.go", "func helper() {}\n"),
        ])
        .unwrap();
        assert_eq!(model.files.len(), 1);
        assert_eq!(model.files[0].path, PathBuf::from("ops/a.go"));
    }
}
