//! Python scripts executed inside the sandbox container.

/// Directory inside the container that receives rendered figures.
pub const OUTPUT_DIR: &str = "/sandbox/output";

/// Prints the allowed libraries that cannot be imported, space-separated.
pub const MISSING_LIBRARIES_SCRIPT: &str = r"import importlib.util, sys
print(' '.join(m for m in sys.argv[1:] if importlib.util.find_spec(m) is None))
";

/// Runs the code read from stdin.
///
/// Prints a two-line header, forces the non-interactive `Agg` backend and
/// saves every open figure as `plot_<n>.png` once the code finishes.
/// Exceptions propagate so the traceback lands on stderr with exit code 1.
pub const RUN_SCRIPT: &str = r#"import os, sys
print("brio-analyst sandbox")
print("python " + sys.version.split()[0])
sys.stdout.flush()
import matplotlib
matplotlib.use("Agg")
import matplotlib.pyplot as plt
source = sys.stdin.read()
try:
    exec(compile(source, "<analysis>", "exec"), {"__name__": "__main__"})
finally:
    os.makedirs("/sandbox/output", exist_ok=True)
    for index, number in enumerate(plt.get_fignums(), start=1):
        plt.figure(number).savefig(f"/sandbox/output/plot_{index}.png")
"#;
