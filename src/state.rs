// Vec-backed: rewriting a name keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStatuses {
    entries: Vec<(String, String)>,
}

impl DeviceStatuses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, status: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, current)) => *current = status.to_string(),
            None => self.entries.push((name.to_string(), status.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for DeviceStatuses {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (name, status) in iter {
            out.insert(&name.into(), &status.into());
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostStatusReport {
    hosts: Vec<(String, DeviceStatuses)>,
}

impl HostStatusReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, host: &str, devices: DeviceStatuses) {
        match self.hosts.iter_mut().find(|(h, _)| h == host) {
            Some((_, current)) => *current = devices,
            None => self.hosts.push((host.to_string(), devices)),
        }
    }

    #[cfg(test)]
    pub fn get(&self, host: &str) -> Option<&DeviceStatuses> {
        self.hosts.iter().find(|(h, _)| h == host).map(|(_, d)| d)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceStatuses)> {
        self.hosts.iter().map(|(h, d)| (h.as_str(), d))
    }

    /// Union of device names across all hosts, first-seen order.
    pub fn device_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for (_, devices) in &self.hosts {
            for name in devices.names() {
                if !columns.contains(&name) {
                    columns.push(name);
                }
            }
        }
        columns
    }
}
