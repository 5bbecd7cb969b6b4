use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::collectors::host::HostEnvironment;
use crate::collectors::task::{Invocation, Section, Task, TaskSource};
use crate::config::CollectorConfig;
use crate::constants::{BOOT_PATH, HOME_PATH, KERNEL_RELEASE_PATH, PROC_PATH, ROOT_HOME_PATH, SYS_PATH};

/// Ordered set of task descriptors.
///
/// Output file names are unique: registering a task whose output collides
/// with an earlier one replaces the earlier descriptor in place.
#[derive(Debug, Default, Clone)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn register(&mut self, task: Task) {
        let existing = self
            .tasks
            .iter()
            .position(|t| t.file_stem == task.file_stem && t.extension == task.extension);

        match existing {
            Some(index) => {
                warn!(
                    "Task '{}' redefines output {}.{}, replacing '{}'",
                    task.name, task.file_stem, task.extension, self.tasks[index].name
                );
                self.tasks[index] = task;
            }
            None => self.tasks.push(task),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn proc_path(entry: &str) -> PathBuf {
    Path::new(PROC_PATH).join(entry)
}

fn sys_path(entry: &str) -> PathBuf {
    Path::new(SYS_PATH).join(entry)
}

/// `/lib/firmware` -> `lib_firmware`
pub fn subtree_slug(root: &str) -> String {
    let slug: String = root
        .trim_matches('/')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if slug.is_empty() {
        "root".to_string()
    } else {
        slug
    }
}

/// `base`, or `base_2`, `base_3`, ... when an earlier name already took it.
fn unique_name(base: String, taken: &mut HashSet<String>) -> String {
    let mut name = base.clone();
    let mut n = 2;
    while !taken.insert(name.clone()) {
        name = format!("{}_{}", base, n);
        n += 1;
    }
    name
}

/// Kernel release of the observed host, e.g. `6.1.0-18-arm64`.
fn kernel_release(host: &HostEnvironment) -> Option<String> {
    fs::read_to_string(host.host_path(Path::new(KERNEL_RELEASE_PATH)))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Home directories as `(user, host path)`, root first then `/home/*` sorted.
fn home_directories(host: &HostEnvironment) -> Vec<(String, PathBuf)> {
    let mut homes = vec![("root".to_string(), PathBuf::from(ROOT_HOME_PATH))];

    if let Ok(entries) = fs::read_dir(host.host_path(Path::new(HOME_PATH))) {
        let mut users: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        users.sort();
        homes.extend(users.into_iter().map(|user| {
            let path = Path::new(HOME_PATH).join(&user);
            (user, path)
        }));
    }

    homes
}

fn hardware_inventory() -> Vec<Section> {
    vec![
        Section::command("uname", &["-a"]),
        Section::command("lscpu", &[]),
        Section::command("free", &["-h"]),
        Section::command("lsblk", &[]),
        Section::command("lsusb", &[]),
        Section::command("lshw", &["-short"]),
        Section::command("dmidecode", &["-t", "system"]),
        Section::command("sensors", &[]),
    ]
}

fn gpu_diagnostics() -> Vec<Section> {
    vec![
        Section::command("nvidia-smi", &[]),
        Section::command("nvidia-smi", &["-q"]),
        Section::command("nvidia-smi", &["topo", "-m"]),
        Section::file("/proc/driver/nvidia/version"),
        Section::command("rocm-smi", &["--showallinfo"]),
        Section::command("clinfo", &["-l"]),
        Section::command("vulkaninfo", &["--summary"]),
        Section::command("glxinfo", &["-B"]),
    ]
}

/// Build the task catalog in its fixed declared order.
///
/// Per-user tasks depend on which history files exist on `host` when the
/// catalog is built. Users or subtrees whose slugs coincide (`a.b` and
/// `a_b`) get numbered names so neither replaces the other.
pub fn default_registry(config: &CollectorConfig, host: &HostEnvironment) -> TaskRegistry {
    let mut registry = TaskRegistry::new();

    registry.register(Task::new(
        "dmesg",
        "Kernel ring buffer",
        TaskSource::Command(Invocation::new("dmesg", &[])),
    ));
    registry.register(Task::new(
        "journal",
        "System journal for the current boot",
        TaskSource::Command(Invocation::new("journalctl", &["--no-pager", "-b"])),
    ));
    registry.register(Task::new("environment", "Process environment", TaskSource::Environment));
    registry.register(Task::new("meminfo", "Memory statistics", TaskSource::HostFile(proc_path("meminfo"))));
    registry.register(Task::new("interrupts", "Interrupt counters", TaskSource::HostFile(proc_path("interrupts"))));
    registry.register(Task::new("modules", "Loaded kernel modules", TaskSource::HostFile(proc_path("modules"))));
    registry.register(Task::new("boot_cmdline", "Kernel command line", TaskSource::HostFile(proc_path("cmdline"))));

    let kernel_config = match kernel_release(host) {
        Some(release) => Path::new(BOOT_PATH).join(format!("config-{}", release)),
        None => {
            debug!("Kernel release unknown, looking for {}/config", BOOT_PATH);
            Path::new(BOOT_PATH).join("config")
        }
    };
    registry.register(Task::new("kernel_config", "Kernel build configuration", TaskSource::HostFile(kernel_config)));

    registry.register(
        Task::new("device_tree", "Flattened device tree blob", TaskSource::HostFile(sys_path("firmware/fdt")))
            .with_extension("dtb"),
    );
    registry.register(Task::new(
        "platform_devices",
        "Platform device listing",
        TaskSource::DirListing(sys_path("bus/platform/devices")),
    ));
    registry.register(Task::new(
        "hardware_inventory",
        "Hardware inventory",
        TaskSource::Aggregate(hardware_inventory()),
    ));
    registry.register(Task::new(
        "pci_tree",
        "PCI topology tree",
        TaskSource::Command(Invocation::new("lspci", &["-tvnn"])),
    ));
    registry.register(Task::new(
        "pci_verbose",
        "Verbose PCI device details",
        TaskSource::Command(Invocation::new("lspci", &["-vvv"])),
    ));
    registry.register(Task::new(
        "numa",
        "NUMA topology",
        TaskSource::Command(Invocation::new("numactl", &["--hardware"])),
    ));
    registry.register(Task::new(
        "gpu_diagnostics",
        "GPU diagnostic bundle",
        TaskSource::Aggregate(gpu_diagnostics()),
    ));

    let mut taken = HashSet::new();

    for (user, home) in home_directories(host) {
        for history in &config.history_files {
            let path = home.join(history);
            if !host.host_path(&path).is_file() {
                continue;
            }
            let shell = history.trim_start_matches('.').trim_end_matches("_history");
            let name = unique_name(
                format!("history_{}_{}", subtree_slug(&user), subtree_slug(shell)),
                &mut taken,
            );
            registry.register(Task::new(
                &name,
                &format!("Shell history of {} ({})", user, history),
                TaskSource::HostFile(path),
            ));
        }
    }

    for root in &config.tree_roots {
        let name = unique_name(format!("tree_{}", subtree_slug(root)), &mut taken);
        registry.register(Task::new(
            &name,
            &format!("Directory tree of {}", root),
            TaskSource::Tree(PathBuf::from(root)),
        ));
    }

    registry.register(Task::new(
        "system_summary",
        "System summary",
        TaskSource::FirstAvailable(vec![
            Invocation::new("fastfetch", &["--pipe"]),
            Invocation::new("neofetch", &["--stdout"]),
        ]),
    ));

    registry
}
