// Copyright (c) 2021, BlockProject 3D
//
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//     * Redistributions in binary form must reproduce the above copyright notice,
//       this list of conditions and the following disclaimer in the documentation
//       and/or other materials provided with the distribution.
//     * Neither the name of BlockProject 3D nor the names of its contributors
//       may be used to endorse or promote products derived from this software
//       without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Variation parameters and their expansion into concrete shader variations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One concrete combination of variation parameter values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShaderVariation
{
    params: BTreeMap<String, i32>
}

impl ShaderVariation
{
    pub fn new() -> ShaderVariation
    {
        ShaderVariation::default()
    }

    pub fn add_param<T: Into<String>>(&mut self, name: T, value: i32)
    {
        self.params.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<i32>
    {
        self.params.get(name).copied()
    }

    pub fn is_empty(&self) -> bool
    {
        self.params.is_empty()
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, i32)>
    {
        self.params.iter().map(|(k, v)| (&**k, *v))
    }

    /// Layers the parameters of this variation as pre-processor defines over `defines`.
    pub fn defines(&self, defines: &BTreeMap<String, String>) -> BTreeMap<String, String>
    {
        let mut res = defines.clone();
        for (name, value) in &self.params {
            res.insert(name.clone(), value.to_string());
        }
        res
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariationOption
{
    pub name: String,
    pub value: i32
}

/// A variation parameter as declared in a shader or mixin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariationData
{
    pub identifier: String,
    pub name: String,
    pub internal: bool,
    /// Empty for a boolean parameter.
    pub values: Vec<VariationOption>
}

impl VariationData
{
    pub fn new<T: Into<String>>(identifier: T) -> VariationData
    {
        VariationData {
            identifier: identifier.into(),
            name: String::new(),
            internal: true,
            values: Vec::new()
        }
    }
}

/// Builds the cross product of all parameter choices. Parameters are consumed from the last
/// declared one; a boolean parameter doubles the set, an enumerated one multiplies it by its
/// value count.
pub fn expand(variations: &[VariationData]) -> Vec<ShaderVariation>
{
    let mut res: Vec<ShaderVariation> = Vec::new();
    if variations.is_empty() {
        res.push(ShaderVariation::new());
        return res;
    }
    for current in variations.iter().rev() {
        if current.values.is_empty() {
            if res.is_empty() {
                let mut b = ShaderVariation::new();
                b.add_param(&*current.identifier, 1);
                res.push(ShaderVariation::new());
                res.push(b);
            } else {
                let count = res.len();
                for i in 0..count {
                    let copy = res[i].clone();
                    res.push(copy);
                    res[i].add_param(&*current.identifier, 1);
                }
            }
        } else if res.is_empty() {
            for option in &current.values {
                let mut variation = ShaderVariation::new();
                variation.add_param(&*current.identifier, option.value);
                res.push(variation);
            }
        } else {
            let count = res.len();
            for i in 0..count {
                for option in &current.values[1..] {
                    let mut copy = res[i].clone();
                    copy.add_param(&*current.identifier, option.value);
                    res.push(copy);
                }
                res[i].add_param(&*current.identifier, current.values[0].value);
            }
        }
    }
    res
}

#[cfg(test)]
mod test
{
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn enumerated(identifier: &str, values: &[i32]) -> VariationData
    {
        let mut data = VariationData::new(identifier);
        data.values = values
            .iter()
            .map(|v| VariationOption {
                name: String::new(),
                value: *v
            })
            .collect();
        data
    }

    #[test]
    fn empty()
    {
        assert_eq!(expand(&[]), vec![ShaderVariation::new()]);
    }

    #[test]
    fn cross_product()
    {
        let variations = expand(&[VariationData::new("A"), enumerated("B", &[0, 1, 2])]);
        assert_eq!(variations.len(), 6);
        let set: HashSet<(i32, i32)> = variations
            .iter()
            .map(|v| (v.get("A").unwrap_or(0), v.get("B").unwrap()))
            .collect();
        assert_eq!(set.len(), 6);
        for a in 0..2 {
            for b in 0..3 {
                assert!(set.contains(&(a, b)));
            }
        }
    }

    #[test]
    fn defines()
    {
        let mut globals = BTreeMap::new();
        globals.insert("A".to_string(), "5".to_string());
        globals.insert("C".to_string(), "1".to_string());
        let mut variation = ShaderVariation::new();
        variation.add_param("A", 2);
        let defines = variation.defines(&globals);
        assert_eq!(defines["A"], "2");
        assert_eq!(defines["C"], "1");
    }

    proptest! {
        #[test]
        fn count_is_product(sizes in proptest::collection::vec(prop_oneof![Just(0usize), 2usize..5], 0..5))
        {
            let variations: Vec<VariationData> = sizes
                .iter()
                .enumerate()
                .map(|(i, n)| enumerated(&format!("V{}", i), &(0..*n as i32).collect::<Vec<i32>>()))
                .collect();
            let expected: usize = sizes.iter().map(|n| std::cmp::max(2, *n)).product();
            let res = expand(&variations);
            prop_assert_eq!(res.len(), expected);
            let unique: HashSet<&ShaderVariation> = res.iter().collect();
            prop_assert_eq!(unique.len(), expected);
        }
    }
}
