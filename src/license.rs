//! License file installation.

use crate::constants::{DEFAULT_LICENSE_YEAR, LICENSE_FILE, YEAR_ENV};
use crate::context::GenerationContext;
use crate::error::Result;
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Licenses the template can install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum License {
    Mit,
    Bsd3Clause,
    Gpl3,
    Apache2,
}

impl FromStr for License {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "MIT" => Ok(Self::Mit),
            "BSD-3-Clause" => Ok(Self::Bsd3Clause),
            "GPL-3.0" => Ok(Self::Gpl3),
            "Apache-2.0" => Ok(Self::Apache2),
            other => Err(format!("unsupported license '{other}'")),
        }
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mit => "MIT",
            Self::Bsd3Clause => "BSD-3-Clause",
            Self::Gpl3 => "GPL-3.0",
            Self::Apache2 => "Apache-2.0",
        })
    }
}

impl License {
    /// Canonical license text, without the copyright line.
    pub fn body(&self) -> &'static str {
        match self {
            Self::Mit => MIT_BODY,
            Self::Bsd3Clause => BSD_3_CLAUSE_BODY,
            Self::Gpl3 => GPL_3_BODY,
            Self::Apache2 => APACHE_2_BODY,
        }
    }

    /// Full license file content.
    pub fn render(&self, year: &str, author: &str) -> String {
        format!("Copyright (c) {year} {author}\n\n{}", self.body())
    }
}

/// Copyright year: `$YEAR` when set, otherwise [`DEFAULT_LICENSE_YEAR`].
pub fn license_year() -> String {
    std::env::var(YEAR_ENV)
        .ok()
        .filter(|year| !year.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LICENSE_YEAR.to_string())
}

/// Writes `LICENSE` into `project_dir` for the selected license.
///
/// # Returns
/// * `Ok(Some(path))` - the license file that was written
/// * `Ok(None)` - the identifier is `None` or not supported; nothing written
pub fn install_license<P: AsRef<Path>>(
    project_dir: P,
    context: &GenerationContext,
    year: &str,
) -> Result<Option<PathBuf>> {
    let license = match context.open_source_license.parse::<License>() {
        Ok(license) => license,
        Err(reason) => {
            debug!("Skipping license file: {reason}");
            return Ok(None);
        }
    };

    let license_path = project_dir.as_ref().join(LICENSE_FILE);
    std::fs::write(&license_path, license.render(year, &context.author_name))?;
    info!("Created {license} license file");
    Ok(Some(license_path))
}

const MIT_BODY: &str = r#"Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE."#;

const BSD_3_CLAUSE_BODY: &str = r#"Redistribution and use in source and binary forms, with or without modification, are permitted provided that the following conditions are met:

1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following disclaimer.

2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the following disclaimer in the documentation and/or other materials provided with the distribution.

3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote products derived from this software without specific prior written permission.

THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE."#;

const GPL_3_BODY: &str = r#"This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>."#;

const APACHE_2_BODY: &str = r#"Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License."#;
