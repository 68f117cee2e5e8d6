// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod allocation_academic_year;
mod instance_academic_year;
mod instance_capacity;
mod profile_structure;

pub use allocation_academic_year::AllocationAcademicYear;
pub use instance_academic_year::InstanceAcademicYear;
pub use instance_capacity::InstanceCapacity;
pub use profile_structure::ProfileStructure;
