use crate::system::Shell;
use crate::{Operation, RemoteHost, Settings};
use anyhow::{Context, Result};

// Constants
const AUTO_INTERP_REMOTE_DIR: &str = "/mnt/ssd-cluster/auto_interp_results/";
const AUTO_INTERP_LOCAL_DIR: &str = "./auto_interp_results";
const MODELS_DIR: &str = "models";
const EXTRA_MODEL_ARTIFACT: &str = "outputs/thinrun/autoencoders_cpu.pkl";
const OUTPUTS_DIR: &str = "outputs";
const PYTHON: &str = "python3.9";

// Dispatcher builds command lines for one remote host and hands them to a shell
pub struct Dispatcher<'a, S: Shell> {
    host: &'a RemoteHost,
    settings: &'a Settings,
    shell: &'a S,
}

impl<'a, S: Shell> Dispatcher<'a, S> {
    #[must_use]
    pub fn new(host: &'a RemoteHost, settings: &'a Settings, shell: &'a S) -> Self {
        Self {
            host,
            settings,
            shell,
        }
    }

    /// Run the named operation to completion
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started or, for
    /// [`Operation::Recent`], if the remote query fails.
    pub fn run(&self, operation: Operation) -> Result<()> {
        match operation {
            Operation::Sync => self.sync_project(),
            Operation::Connect => self.connect(),
            Operation::Models => self.copy_models(),
            Operation::Recent => self.copy_most_recent_output(),
            Operation::Setup => self.setup_remote_environment(),
            Operation::Secrets => self.copy_secrets(),
            Operation::InterpSync => self.sync_auto_interp_results(),
            Operation::Dotfiles => self.copy_dotfiles(),
            Operation::Datasets => self.sync_datasets(),
        }
        .with_context(|| format!("{operation} failed"))
    }

    // Command builders

    fn ssh_transport(&self) -> String {
        format!("-e \"ssh -p {}\"", self.host.port)
    }

    fn remote_project(&self) -> String {
        format!("{}:{}", self.host.address(), self.settings.project_dir())
    }

    #[must_use]
    pub fn sync_project_command(&self) -> String {
        format!(
            "rsync -rv --filter \":- .gitignore\" --exclude \".git\" {} . {}",
            self.ssh_transport(),
            self.remote_project()
        )
    }

    #[must_use]
    pub fn sync_datasets_command(&self) -> String {
        format!(
            "rsync -am --include \"*.csv\" --exclude \"*\" {} . {}",
            self.ssh_transport(),
            self.remote_project()
        )
    }

    #[must_use]
    pub fn sync_auto_interp_results_command(&self) -> String {
        format!(
            "rsync -r --exclude \"*.hdf\" --exclude \"*.pkl\" {} {}:{AUTO_INTERP_REMOTE_DIR} {AUTO_INTERP_LOCAL_DIR}",
            self.ssh_transport(),
            self.host.address()
        )
    }

    #[must_use]
    pub fn copy_models_commands(&self) -> [String; 2] {
        let port = self.host.port;
        let remote = self.remote_project();
        [
            format!("scp -P {port} -r {MODELS_DIR} {remote}/{MODELS_DIR}"),
            format!("scp -P {port} -r {EXTRA_MODEL_ARTIFACT} {remote}"),
        ]
    }

    #[must_use]
    pub fn copy_secrets_command(&self) -> String {
        format!(
            "rsync -rv {} ./secrets {}",
            self.ssh_transport(),
            self.remote_project()
        )
    }

    #[must_use]
    pub fn most_recent_output_query(&self) -> String {
        format!(
            "ssh -p {} {} \"ls -td {}/{OUTPUTS_DIR}/* | head -1\"",
            self.host.port,
            self.host.address(),
            self.settings.project_dir()
        )
    }

    #[must_use]
    pub fn copy_output_command(&self, remote_path: &str) -> String {
        format!(
            "scp -P {} -r {}:{remote_path} {OUTPUTS_DIR}",
            self.host.port,
            self.host.address()
        )
    }

    #[must_use]
    pub fn copy_dotfiles_commands(&self) -> [String; 2] {
        let port = self.host.port;
        let address = self.host.address();
        let dotfiles_dir = self.settings.dotfiles_dir();
        [
            format!(
                "rsync -rv --filter ':- .gitignore' --exclude '.git' -e 'ssh -p {port}' {} {address}:{dotfiles_dir}",
                self.settings.dotfiles_source
            ),
            format!("ssh -p {port} {address} 'cd ~/{dotfiles_dir} && ./install.sh && ./deploy.sh'"),
        ]
    }

    #[must_use]
    pub fn connect_command(&self) -> String {
        format!("ssh -p {} {}", self.host.port, self.host.address())
    }

    #[must_use]
    pub fn environment_setup_command(&self) -> String {
        format!(
            "ssh -p {} {} \"cd {} && sudo apt -y install {PYTHON} {PYTHON}-venv && {PYTHON} -m venv .env --system-site-packages && source .env/bin/activate && pip install -r requirements.txt\"",
            self.host.port,
            self.host.address(),
            self.settings.project_dir()
        )
    }

    // Operations

    /// Mirror the working directory onto the remote project directory
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started.
    pub fn sync_project(&self) -> Result<()> {
        self.shell.call(&self.sync_project_command())
    }

    /// Push only the `.csv` files of the working directory
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started.
    pub fn sync_datasets(&self) -> Result<()> {
        self.shell.call(&self.sync_datasets_command())
    }

    /// Pull the auto-interp results, skipping binary artifacts
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started.
    pub fn sync_auto_interp_results(&self) -> Result<()> {
        let command = self.sync_auto_interp_results_command();
        println!("{command}");
        self.shell.call(&command)
    }

    /// Copy the models directory and the pickled autoencoders
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started.
    pub fn copy_models(&self) -> Result<()> {
        for command in self.copy_models_commands() {
            self.shell.call(&command)?;
        }
        Ok(())
    }

    /// Push the local secrets directory
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started.
    pub fn copy_secrets(&self) -> Result<()> {
        self.shell.call(&self.copy_secrets_command())
    }

    /// Find the newest remote outputs folder and copy it into `outputs`
    ///
    /// The query result is used as the copy source without any validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or prints non UTF-8 text.
    pub fn copy_most_recent_output(&self) -> Result<()> {
        let stdout = self
            .shell
            .check_output(&self.most_recent_output_query())
            .context("failed to query most recent output folder")?;
        let stdout =
            String::from_utf8(stdout).context("most recent output query printed invalid UTF-8")?;
        let remote_path = stdout.trim();
        tracing::info!(%remote_path, "copying most recent output");

        self.shell.call(&self.copy_output_command(remote_path))
    }

    /// Push the dotfiles tree then run its install and deploy scripts remotely
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started.
    pub fn copy_dotfiles(&self) -> Result<()> {
        for command in self.copy_dotfiles_commands() {
            self.shell.call(&command)?;
        }
        Ok(())
    }

    /// Open an interactive shell on the remote host
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started.
    pub fn connect(&self) -> Result<()> {
        self.shell.call(&self.connect_command())
    }

    /// Sync, copy models and secrets, then build the remote virtualenv
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started.
    pub fn setup_remote_environment(&self) -> Result<()> {
        tracing::info!("syncing project");
        self.sync_project()?;
        tracing::info!("copying models");
        self.copy_models()?;
        tracing::info!("copying secrets");
        self.copy_secrets()?;
        tracing::info!("installing {PYTHON} environment");
        self.shell.call(&self.environment_setup_command())
    }
}
