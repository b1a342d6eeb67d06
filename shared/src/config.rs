use std::default::Default;

/// Named on/off switches of a `Ddd` context
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DddOption {
    /// Warn when the local priority of a coupled object is changed
    WarnPriorityChange,
    /// Keep the allocation of emptied coupling lists for reuse
    UseFreelist,
    /// Warn when an object is registered with a record size other than its type's
    WarnVarSizeObject,
    /// Warn when an object is registered with a record size smaller than its type's
    WarnSmallSize,
    /// Interfaces are only rebuilt by explicit calls to `rebuild_interface`/`rebuild_all`
    CreateInterfacesExplicitly,
    /// Do not log individual consistency-check findings, only count them
    QuietConsistencyCheck,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    pub warn_priority_change: bool,
    pub use_freelist: bool,
    pub warn_var_size_object: bool,
    pub warn_small_size: bool,
    pub create_interfaces_explicitly: bool,
    pub quiet_consistency_check: bool,
}

impl Options {
    pub fn get(&self, option: DddOption) -> bool {
        match option {
            DddOption::WarnPriorityChange => self.warn_priority_change,
            DddOption::UseFreelist => self.use_freelist,
            DddOption::WarnVarSizeObject => self.warn_var_size_object,
            DddOption::WarnSmallSize => self.warn_small_size,
            DddOption::CreateInterfacesExplicitly => self.create_interfaces_explicitly,
            DddOption::QuietConsistencyCheck => self.quiet_consistency_check,
        }
    }

    pub fn set(&mut self, option: DddOption, value: bool) {
        let slot = match option {
            DddOption::WarnPriorityChange => &mut self.warn_priority_change,
            DddOption::UseFreelist => &mut self.use_freelist,
            DddOption::WarnVarSizeObject => &mut self.warn_var_size_object,
            DddOption::WarnSmallSize => &mut self.warn_small_size,
            DddOption::CreateInterfacesExplicitly => &mut self.create_interfaces_explicitly,
            DddOption::QuietConsistencyCheck => &mut self.quiet_consistency_check,
        };
        *slot = value;
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            warn_priority_change: true,
            use_freelist: true,
            warn_var_size_object: true,
            warn_small_size: true,
            create_interfaces_explicitly: false,
            quiet_consistency_check: false,
        }
    }
}

/// Contains Config properties which will be used by a `Ddd` context
#[derive(Clone, Debug)]
pub struct DddConfig {
    /// Object table capacity before the first geometric growth
    pub initial_object_capacity: usize,
    /// Coupling count at which the first growth warning fires. Coupling
    /// lists are allocated per object as couplings arrive.
    pub initial_coupling_capacity: usize,
    /// Upper bound on completion polls of one exchange or batched connect.
    /// Rank 0's value is broadcast to every process when the context is created.
    pub max_poll_retries: u64,
    /// Exclusive bound of the per-process GID counter
    pub gid_counter_limit: u64,
    pub options: Options,
}

impl DddConfig {
    pub fn with_option(mut self, option: DddOption, value: bool) -> Self {
        self.options.set(option, value);
        self
    }
}

impl Default for DddConfig {
    fn default() -> Self {
        Self {
            initial_object_capacity: 64,
            initial_coupling_capacity: 64,
            max_poll_retries: 50_000_000,
            gid_counter_limit: 1 << 40,
            options: Options::default(),
        }
    }
}
